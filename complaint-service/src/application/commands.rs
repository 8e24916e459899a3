use crate::domain::model::{ComplaintId, ComplaintSubmission};

/// 提交投诉命令（字段已在接口层校验）
#[derive(Debug, Clone)]
pub struct CreateComplaintCommand {
    pub product_id: String,
    pub content: String,
    pub reported_by: String,
    pub client_ip: String,
}

impl From<CreateComplaintCommand> for ComplaintSubmission {
    fn from(command: CreateComplaintCommand) -> Self {
        Self {
            product_id: command.product_id,
            content: command.content,
            reported_by: command.reported_by,
            client_ip: command.client_ip,
        }
    }
}

/// 更新投诉内容命令
#[derive(Debug, Clone)]
pub struct UpdateComplaintCommand {
    pub id: ComplaintId,
    pub content: String,
}
