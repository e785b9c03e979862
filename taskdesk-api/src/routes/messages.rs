/// Task message endpoints
///
/// - `GET    /v1/tasks/:id/messages` - Task log, oldest first
/// - `POST   /v1/tasks/:id/messages` - Post a message as the caller
/// - `PUT    /v1/messages/:id` - Edit a user message
/// - `DELETE /v1/messages/:id` - Soft delete a user message
///
/// System messages are read-only.

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
    extract::{ApiJson, ApiPath},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskdesk_shared::{auth::middleware::AuthContext, models::message::TaskMessage};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct MessageRequest {
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
}

pub async fn list_messages(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<TaskMessage>>> {
    Ok(Json(state.messages.list(task_id).await?))
}

pub async fn post_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<MessageRequest>,
) -> ApiResult<(StatusCode, Json<TaskMessage>)> {
    validate_request(&req)?;
    let message = state
        .messages
        .post(task_id, auth.employee_id, req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn edit_message(
    State(state): State<AppState>,
    ApiPath(message_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<MessageRequest>,
) -> ApiResult<Json<TaskMessage>> {
    validate_request(&req)?;
    Ok(Json(state.messages.edit(message_id, req.content).await?))
}

pub async fn delete_message(
    State(state): State<AppState>,
    ApiPath(message_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.messages.delete(message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
