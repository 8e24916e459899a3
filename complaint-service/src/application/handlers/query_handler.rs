use std::sync::Arc;

use complaint_core::ComplaintResult;

use crate::application::dto::ComplaintResponse;
use crate::application::queries::{GetComplaintQuery, ListComplaintsQuery};
use crate::domain::service::ComplaintDomainService;

/// 投诉查询处理器
pub struct ComplaintQueryHandler {
    domain_service: Arc<ComplaintDomainService>,
}

impl ComplaintQueryHandler {
    pub fn new(domain_service: Arc<ComplaintDomainService>) -> Self {
        Self { domain_service }
    }

    pub async fn handle_list_complaints(
        &self,
        _query: ListComplaintsQuery,
    ) -> ComplaintResult<Vec<ComplaintResponse>> {
        let complaints = self.domain_service.list_all().await?;
        Ok(complaints.iter().map(ComplaintResponse::from).collect())
    }

    pub async fn handle_get_complaint(
        &self,
        query: GetComplaintQuery,
    ) -> ComplaintResult<ComplaintResponse> {
        let complaint = self.domain_service.get_by_id(query.id).await?;
        Ok(complaint.into())
    }
}
