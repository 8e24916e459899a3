//! 投诉领域模型
//!
//! `Complaint` 是不可变快照：所有变更都通过返回新快照的纯函数完成，
//! 再交给仓储持久化，不存在"改了一半"的中间状态。

use chrono::{DateTime, Utc};
use complaint_core::{ComplaintError, ComplaintResult};

/// 投诉ID（由持久化层在首次保存时分配）
pub type ComplaintId = i64;

/// 地理定位失败时使用的国家哨兵值
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// 已持久化的投诉快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complaint {
    id: ComplaintId,
    product_id: String,
    content: String,
    created_at: DateTime<Utc>,
    reported_by: String,
    country: String,
    counter: i32,
    // 乐观锁版本号，仅持久化层使用
    version: i64,
}

/// 从存储恢复投诉快照的参数
#[derive(Debug, Clone)]
pub struct ComplaintRestoreParams {
    pub id: ComplaintId,
    pub product_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub reported_by: String,
    pub country: String,
    pub counter: i32,
    pub version: i64,
}

impl Complaint {
    /// 从存储恢复（仓储实现使用）
    pub fn restore(params: ComplaintRestoreParams) -> Self {
        Self {
            id: params.id,
            product_id: params.product_id,
            content: params.content,
            created_at: params.created_at,
            reported_by: params.reported_by,
            country: params.country,
            counter: params.counter,
            version: params.version,
        }
    }

    /// 同一举报人对同一商品的重复投诉：仅计数加一
    ///
    /// 新提交的内容和国家被丢弃，首次提交的内容保持权威。
    /// 计数已到 `i32::MAX` 时返回 `CounterOverflow`。
    pub fn with_incremented_counter(&self) -> ComplaintResult<Self> {
        let counter = self
            .counter
            .checked_add(1)
            .ok_or(ComplaintError::CounterOverflow(self.id))?;
        Ok(Self {
            counter,
            ..self.clone()
        })
    }

    /// 替换投诉内容，其他字段保持不变
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }

    /// 持久化成功后的下一版本快照（仓储实现使用）
    pub fn with_next_version(&self) -> Self {
        Self {
            version: self.version + 1,
            ..self.clone()
        }
    }

    pub fn id(&self) -> ComplaintId {
        self.id
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn reported_by(&self) -> &str {
        &self.reported_by
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn counter(&self) -> i32 {
        self.counter
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// 去重键是否一致
    pub fn matches_key(&self, product_id: &str, reported_by: &str) -> bool {
        self.product_id == product_id && self.reported_by == reported_by
    }
}

/// 尚未持久化的投诉（首次提交）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComplaint {
    pub product_id: String,
    pub content: String,
    pub reported_by: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

impl NewComplaint {
    pub fn new(
        product_id: impl Into<String>,
        content: impl Into<String>,
        reported_by: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            content: content.into(),
            reported_by: reported_by.into(),
            country: country.into(),
            created_at: Utc::now(),
        }
    }

    /// 分配ID后的首个快照，计数从 1 开始
    pub fn into_complaint(self, id: ComplaintId) -> Complaint {
        Complaint::restore(ComplaintRestoreParams {
            id,
            product_id: self.product_id,
            content: self.content,
            created_at: self.created_at,
            reported_by: self.reported_by,
            country: self.country,
            counter: 1,
            version: 0,
        })
    }
}

/// 一次投诉提交（已通过字段校验）
#[derive(Debug, Clone)]
pub struct ComplaintSubmission {
    pub product_id: String,
    pub content: String,
    pub reported_by: String,
    pub client_ip: String,
}
