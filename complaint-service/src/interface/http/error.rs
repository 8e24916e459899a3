use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use complaint_core::ComplaintError;
use serde::Serialize;
use tracing::error;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

/// HTTP 接口错误
///
/// 领域错误按类型映射状态码；请求体或路径无法解析时为 `BadRequest`。
#[derive(Debug)]
pub enum ApiError {
    Domain(ComplaintError),
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Domain(err) => match err {
                ComplaintError::NotFound(_) => StatusCode::NOT_FOUND,
                ComplaintError::Validation { .. } => StatusCode::BAD_REQUEST,
                ComplaintError::Conflict(_) | ComplaintError::CounterOverflow(_) => {
                    StatusCode::CONFLICT
                }
                ComplaintError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<ComplaintError> for ApiError {
    fn from(err: ComplaintError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, errors) = match self {
            Self::BadRequest(message) => (message, None),
            Self::Domain(ComplaintError::Validation { message, errors }) => (message, Some(errors)),
            Self::Domain(ComplaintError::Internal(err)) => {
                // 细节只进日志，不返回给调用方
                let detail = format!("{err:#}");
                error!(error = %detail, "request failed with internal error");
                (INTERNAL_ERROR_MESSAGE.to_string(), None)
            }
            Self::Domain(other) => (other.to_string(), None),
        };

        let body = ErrorBody {
            status: status.as_u16(),
            message,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            errors,
        };

        (status, Json(body)).into_response()
    }
}
