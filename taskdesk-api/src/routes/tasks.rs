/// Task endpoints
///
/// - `GET    /v1/tasks?status=&archived=` - List tasks
/// - `POST   /v1/tasks` - Create a task; the caller is the creator
/// - `GET    /v1/tasks/:id`, `PUT`, `DELETE`
/// - `PATCH  /v1/tasks/:id/status` - Transition status
/// - `PATCH  /v1/tasks/:id/archive` - Archive
/// - `GET    /v1/tasks/:id/participants`, `POST`
/// - `DELETE /v1/tasks/:id/participants/:employee_id/:role`
/// - `GET    /v1/employees/:id/tasks` - Tasks an employee participates in
///
/// # Example
///
/// ```text
/// POST /v1/tasks
/// Authorization: Bearer eyJ...
///
/// {
///   "title": "Ship release notes",
///   "priority": 1,
///   "participants": [
///     { "employee_id": "…", "role": "executor" }
///   ]
/// }
/// ```

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskdesk_shared::{
    auth::middleware::AuthContext,
    models::{
        participant::{NewParticipant, ParticipantRole, TaskParticipant},
        task::{Task, TaskChanges, TaskFilter, TaskStatus},
    },
    tasks::TaskDraft,
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub archived: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantRequest {
    pub employee_id: Uuid,
    pub role: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 3, max = 500, message = "Title must be 3 to 500 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    #[validate(range(min = 0, max = 2, message = "Priority must be between 0 and 2"))]
    pub priority: i32,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub participants: Vec<ParticipantRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 3, max = 500, message = "Title must be 3 to 500 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 0, max = 2, message = "Priority must be between 0 and 2"))]
    pub priority: Option<i32>,

    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

fn parse_role(role: &str) -> ApiResult<ParticipantRole> {
    role.parse()
        .map_err(|e: taskdesk_shared::models::UnknownVariant| ApiError::BadRequest(e.to_string()))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let tasks = state
        .tasks
        .list_tasks(TaskFilter {
            status,
            archived: query.archived,
        })
        .await?;

    Ok(Json(tasks))
}

/// Create a task in status `new`
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `400 Bad Request`: Unknown role or nonexistent participant; nothing is stored
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    validate_request(&req)?;

    let participants = req
        .participants
        .iter()
        .map(|p| -> ApiResult<NewParticipant> {
            Ok(NewParticipant {
                employee_id: p.employee_id,
                role: parse_role(&p.role)?,
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let task = state
        .tasks
        .create_task(
            auth.employee_id,
            TaskDraft {
                title: req.title,
                description: req.description,
                priority: req.priority,
                due_date: req.due_date,
                participants,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.get_task(id).await?))
}

/// Update descriptive fields; status changes go through `/status`
pub async fn update_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    validate_request(&req)?;

    let task = state
        .tasks
        .update_task(
            id,
            TaskChanges {
                title: req.title,
                description: req.description,
                priority: req.priority,
                due_date: req.due_date,
            },
        )
        .await?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.tasks.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a task to another status
///
/// A transition to the current status is a no-op and logs nothing.
pub async fn transition_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.transition_status(id, &req.status).await?))
}

pub async fn archive_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.archive(id).await?))
}

pub async fn list_participants(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<TaskParticipant>>> {
    Ok(Json(state.tasks.list_participants(id).await?))
}

pub async fn add_participant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ParticipantRequest>,
) -> ApiResult<(StatusCode, Json<TaskParticipant>)> {
    let participant = state
        .tasks
        .add_participant(id, req.employee_id, &req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn remove_participant(
    State(state): State<AppState>,
    ApiPath((id, employee_id, role)): ApiPath<(Uuid, Uuid, String)>,
) -> ApiResult<StatusCode> {
    state
        .tasks
        .remove_participant(id, employee_id, &role)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_employee_tasks(
    State(state): State<AppState>,
    ApiPath(employee_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.tasks.list_tasks_for_employee(employee_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_rejects_unknown() {
        assert_eq!(parse_role("customer").unwrap(), ParticipantRole::Customer);
        match parse_role("owner") {
            Err(ApiError::BadRequest(msg)) => assert!(msg.contains("owner")),
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_create_request_validation() {
        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title": "ok?", "priority": 3}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("priority"));
        assert!(!errors.field_errors().contains_key("title"));

        let req: CreateTaskRequest = serde_json::from_str(r#"{"title": "Do it"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.priority, 0);
        assert!(req.participants.is_empty());
    }
}
