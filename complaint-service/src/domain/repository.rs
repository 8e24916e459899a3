use std::sync::Arc;

use async_trait::async_trait;
use complaint_core::ComplaintError;
use thiserror::Error;

use crate::domain::model::{Complaint, ComplaintId, NewComplaint};

/// 仓储写入错误
///
/// 领域服务需要区分并发冲突（可重试）与其他基础设施故障。
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// (product_id, reported_by) 唯一约束冲突
    #[error("duplicate complaint for product {product_id} reported by {reported_by}")]
    DuplicateKey {
        product_id: String,
        reported_by: String,
    },

    /// 乐观锁版本不一致，记录已被其他写入者修改
    #[error("stale write for complaint {0}")]
    StaleWrite(ComplaintId),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for ComplaintError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Other(inner) => ComplaintError::Internal(inner),
            conflict => ComplaintError::Conflict(conflict.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    /// 按主键顺序返回全部投诉
    async fn find_all(&self) -> RepositoryResult<Vec<Complaint>>;
    async fn find_by_id(&self, id: ComplaintId) -> RepositoryResult<Option<Complaint>>;
    async fn find_by_product_id_and_reported_by(
        &self,
        product_id: &str,
        reported_by: &str,
    ) -> RepositoryResult<Option<Complaint>>;
    /// 插入新投诉并分配ID；去重键已存在时返回 `DuplicateKey`
    async fn insert(&self, complaint: &NewComplaint) -> RepositoryResult<Complaint>;
    /// 保存已存在投诉的新快照；版本不一致时返回 `StaleWrite`
    async fn save(&self, complaint: &Complaint) -> RepositoryResult<Complaint>;
}

/// IP 地理定位能力
///
/// 全函数：任何失败都折叠为 `UNKNOWN_COUNTRY`，从不向调用方报错。
#[async_trait]
pub trait GeolocationResolver: Send + Sync {
    async fn resolve_country(&self, ip_address: &str) -> String;
}

pub type ComplaintRepositoryRef = Arc<dyn ComplaintRepository>;
pub type GeolocationResolverRef = Arc<dyn GeolocationResolver>;
