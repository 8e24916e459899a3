use std::sync::Arc;

use complaint_core::ComplaintResult;
use tracing::debug;

use crate::application::commands::{CreateComplaintCommand, UpdateComplaintCommand};
use crate::application::dto::ComplaintResponse;
use crate::domain::service::ComplaintDomainService;

/// 投诉命令处理器
pub struct ComplaintCommandHandler {
    domain_service: Arc<ComplaintDomainService>,
}

impl ComplaintCommandHandler {
    pub fn new(domain_service: Arc<ComplaintDomainService>) -> Self {
        Self { domain_service }
    }

    /// 处理提交投诉命令
    pub async fn handle_create_complaint(
        &self,
        command: CreateComplaintCommand,
    ) -> ComplaintResult<ComplaintResponse> {
        debug!(
            product_id = %command.product_id,
            reported_by = %command.reported_by,
            client_ip = %command.client_ip,
            "Handling create complaint command"
        );

        let complaint = self.domain_service.create(command.into()).await?;
        Ok(complaint.into())
    }

    /// 处理更新投诉内容命令
    pub async fn handle_update_complaint(
        &self,
        command: UpdateComplaintCommand,
    ) -> ComplaintResult<ComplaintResponse> {
        debug!(id = command.id, "Handling update complaint command");

        let complaint = self
            .domain_service
            .update_content(command.id, &command.content)
            .await?;
        Ok(complaint.into())
    }
}
