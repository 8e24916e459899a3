//! 投诉服务错误类型定义

use std::collections::BTreeMap;

use thiserror::Error;

/// 未找到投诉时的消息前缀
pub const COMPLAINT_NOT_FOUND_MESSAGE: &str = "Complaint not found with id: ";

/// 投诉服务错误类型
#[derive(Debug, Error)]
pub enum ComplaintError {
    /// 投诉未找到
    #[error("{COMPLAINT_NOT_FOUND_MESSAGE}{0}")]
    NotFound(i64),

    /// 请求参数校验失败（字段名 -> 错误描述）
    #[error("{message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, String>,
    },

    /// 并发写入冲突，重试后仍未成功
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// 重复投诉计数已达上限，无法再加一
    #[error("Complaint counter limit reached for id: {0}")]
    CounterOverflow(i64),

    /// 基础设施错误
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ComplaintError {
    /// 构造单字段校验错误
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), message.into());
        ComplaintError::Validation {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ComplaintError::NotFound(_))
    }
}

/// 投诉服务结果类型
pub type ComplaintResult<T> = Result<T, ComplaintError>;
