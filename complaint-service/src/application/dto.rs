use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::model::{Complaint, ComplaintId};

/// 对外暴露的投诉投影（不包含内部版本号）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintResponse {
    pub id: ComplaintId,
    pub product_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub reported_by: String,
    pub country: String,
    pub counter: i32,
}

impl From<&Complaint> for ComplaintResponse {
    fn from(complaint: &Complaint) -> Self {
        Self {
            id: complaint.id(),
            product_id: complaint.product_id().to_string(),
            content: complaint.content().to_string(),
            created_at: complaint.created_at(),
            reported_by: complaint.reported_by().to_string(),
            country: complaint.country().to_string(),
            counter: complaint.counter(),
        }
    }
}

impl From<Complaint> for ComplaintResponse {
    fn from(complaint: Complaint) -> Self {
        Self::from(&complaint)
    }
}
