use std::collections::BTreeMap;

use complaint_core::{ComplaintError, ComplaintResult};
use serde::Deserialize;

/// 投诉内容默认最大字符数
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 1000;

const VALIDATION_FAILED: &str = "Validation failed";

/// 提交投诉请求体
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateComplaintRequest {
    pub product_id: String,
    pub content: String,
    pub reported_by: String,
}

/// 更新投诉请求体
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateComplaintRequest {
    pub content: String,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_content(errors: &mut BTreeMap<String, String>, content: &str, max_length: usize) {
    if is_blank(content) {
        errors.insert("content".into(), "Content cannot be empty".into());
    } else if content.chars().count() > max_length {
        errors.insert(
            "content".into(),
            format!("Content must be less than {max_length} characters"),
        );
    }
}

fn into_result(errors: BTreeMap<String, String>) -> ComplaintResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ComplaintError::Validation {
            message: VALIDATION_FAILED.to_string(),
            errors,
        })
    }
}

pub fn validate_create(request: &CreateComplaintRequest, max_length: usize) -> ComplaintResult<()> {
    let mut errors = BTreeMap::new();
    if is_blank(&request.product_id) {
        errors.insert("productId".into(), "Product ID cannot be empty".into());
    }
    check_content(&mut errors, &request.content, max_length);
    if is_blank(&request.reported_by) {
        errors.insert("reportedBy".into(), "Reporter name cannot be empty".into());
    }
    into_result(errors)
}

pub fn validate_update(request: &UpdateComplaintRequest, max_length: usize) -> ComplaintResult<()> {
    let mut errors = BTreeMap::new();
    check_content(&mut errors, &request.content, max_length);
    into_result(errors)
}
