use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::client_ip::ClientIp;
use super::error::ApiError;
use super::state::AppState;
use super::validation::{
    CreateComplaintRequest, UpdateComplaintRequest, validate_create, validate_update,
};
use crate::application::commands::{CreateComplaintCommand, UpdateComplaintCommand};
use crate::application::dto::ComplaintResponse;
use crate::application::queries::{GetComplaintQuery, ListComplaintsQuery};
use crate::domain::model::ComplaintId;

fn complaint_id(path: Result<Path<ComplaintId>, PathRejection>) -> Result<ComplaintId, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// 存活探针
pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn list_complaints(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ComplaintResponse>>, ApiError> {
    let complaints = state
        .query_handler
        .handle_list_complaints(ListComplaintsQuery)
        .await?;
    Ok(Json(complaints))
}

pub async fn get_complaint(
    State(state): State<Arc<AppState>>,
    path: Result<Path<ComplaintId>, PathRejection>,
) -> Result<Json<ComplaintResponse>, ApiError> {
    let id = complaint_id(path)?;
    let complaint = state
        .query_handler
        .handle_get_complaint(GetComplaintQuery { id })
        .await?;
    Ok(Json(complaint))
}

/// 提交投诉，新建或重复提交都返回 201
pub async fn create_complaint(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    body: Result<Json<CreateComplaintRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ComplaintResponse>), ApiError> {
    let request = json_body(body)?;
    validate_create(&request, state.max_content_length)?;

    let complaint = state
        .command_handler
        .handle_create_complaint(CreateComplaintCommand {
            product_id: request.product_id,
            content: request.content,
            reported_by: request.reported_by,
            client_ip,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

pub async fn update_complaint(
    State(state): State<Arc<AppState>>,
    path: Result<Path<ComplaintId>, PathRejection>,
    body: Result<Json<UpdateComplaintRequest>, JsonRejection>,
) -> Result<Json<ComplaintResponse>, ApiError> {
    let id = complaint_id(path)?;
    let request = json_body(body)?;
    validate_update(&request, state.max_content_length)?;

    let complaint = state
        .command_handler
        .handle_update_complaint(UpdateComplaintCommand {
            id,
            content: request.content,
        })
        .await?;
    Ok(Json(complaint))
}
