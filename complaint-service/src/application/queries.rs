use crate::domain::model::ComplaintId;

/// 按ID查询投诉
#[derive(Debug, Clone, Copy)]
pub struct GetComplaintQuery {
    pub id: ComplaintId,
}

/// 列出全部投诉
#[derive(Debug, Clone, Copy, Default)]
pub struct ListComplaintsQuery;
