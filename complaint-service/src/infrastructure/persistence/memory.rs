use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::model::{Complaint, ComplaintId, NewComplaint};
use crate::domain::repository::{ComplaintRepository, RepositoryError, RepositoryResult};

#[derive(Default)]
struct InMemoryState {
    // BTreeMap 保证按ID（插入顺序）遍历
    rows: BTreeMap<ComplaintId, Complaint>,
    last_id: ComplaintId,
}

/// 内存投诉仓储
///
/// 与 PostgreSQL 实现遵循相同的唯一约束和乐观锁规则，
/// 用于开发环境（未配置数据库时）和测试。
#[derive(Clone, Default)]
pub struct InMemoryComplaintRepository {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryComplaintRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ComplaintRepository for InMemoryComplaintRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Complaint>> {
        let state = self.state.read().await;
        Ok(state.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: ComplaintId) -> RepositoryResult<Option<Complaint>> {
        let state = self.state.read().await;
        Ok(state.rows.get(&id).cloned())
    }

    async fn find_by_product_id_and_reported_by(
        &self,
        product_id: &str,
        reported_by: &str,
    ) -> RepositoryResult<Option<Complaint>> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .values()
            .find(|row| row.matches_key(product_id, reported_by))
            .cloned())
    }

    async fn insert(&self, complaint: &NewComplaint) -> RepositoryResult<Complaint> {
        let mut state = self.state.write().await;

        if state
            .rows
            .values()
            .any(|row| row.matches_key(&complaint.product_id, &complaint.reported_by))
        {
            return Err(RepositoryError::DuplicateKey {
                product_id: complaint.product_id.clone(),
                reported_by: complaint.reported_by.clone(),
            });
        }

        state.last_id += 1;
        let stored = complaint.clone().into_complaint(state.last_id);
        state.rows.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn save(&self, complaint: &Complaint) -> RepositoryResult<Complaint> {
        let mut state = self.state.write().await;

        let Some(current) = state.rows.get(&complaint.id()) else {
            return Err(RepositoryError::StaleWrite(complaint.id()));
        };
        if current.version() != complaint.version() {
            return Err(RepositoryError::StaleWrite(complaint.id()));
        }

        let stored = complaint.with_next_version();
        state.rows.insert(stored.id(), stored.clone());
        Ok(stored)
    }
}
