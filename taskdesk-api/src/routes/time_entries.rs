/// Time tracking endpoints
///
/// - `GET    /v1/tasks/:id/time-entries` - Entries of a task
/// - `POST   /v1/tasks/:id/time-entries` - Log hours as the caller
/// - `GET    /v1/tasks/:id/time-summary` - Totals over live entries
/// - `GET    /v1/time-entries/:id` - One entry
/// - `PUT    /v1/time-entries/:id` - Change hours, description or date
/// - `DELETE /v1/time-entries/:id` - Soft delete an entry
/// - `GET    /v1/employees/:id/time-entries?start_date=&end_date=` - Entries
///   an employee logged, optionally within an inclusive date range

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use taskdesk_shared::{
    auth::middleware::AuthContext,
    models::time_entry::{DateRange, TimeEntry, TimeEntryChanges, TimeSummary},
    tasks::TimeLog,
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct LogTimeRequest {
    #[validate(range(exclusive_min = 0.0, message = "Hours must be positive"))]
    pub hours: f64,

    pub description: Option<String>,

    /// Defaults to today (UTC)
    pub entry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTimeEntryRequest {
    #[validate(range(exclusive_min = 0.0, message = "Hours must be positive"))]
    pub hours: Option<f64>,

    pub description: Option<String>,

    pub entry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn list_time_entries(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<TimeEntry>>> {
    Ok(Json(state.time_entries.list(task_id).await?))
}

pub async fn log_time(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<LogTimeRequest>,
) -> ApiResult<(StatusCode, Json<TimeEntry>)> {
    validate_request(&req)?;

    let entry = state
        .time_entries
        .log(
            task_id,
            auth.employee_id,
            TimeLog {
                hours: req.hours,
                description: req.description,
                entry_date: req.entry_date,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn time_summary(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<TimeSummary>> {
    Ok(Json(state.time_entries.summary(task_id).await?))
}

pub async fn get_time_entry(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<Uuid>,
) -> ApiResult<Json<TimeEntry>> {
    Ok(Json(state.time_entries.get(entry_id).await?))
}

/// Update a time entry
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Hours not positive
/// - `404 Not Found`: Entry absent or deleted
pub async fn update_time_entry(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTimeEntryRequest>,
) -> ApiResult<Json<TimeEntry>> {
    validate_request(&req)?;

    let entry = state
        .time_entries
        .update(
            entry_id,
            TimeEntryChanges {
                hours: req.hours,
                description: req.description,
                entry_date: req.entry_date,
            },
        )
        .await?;

    Ok(Json(entry))
}

pub async fn list_employee_time_entries(
    State(state): State<AppState>,
    ApiPath(employee_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> ApiResult<Json<Vec<TimeEntry>>> {
    let range = DateRange {
        from: query.start_date,
        to: query.end_date,
    };
    Ok(Json(
        state
            .time_entries
            .list_for_employee(employee_id, range)
            .await?,
    ))
}

pub async fn delete_time_entry(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.time_entries.delete(entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_validation() {
        let req: UpdateTimeEntryRequest = serde_json::from_str(r#"{"hours": 0}"#).unwrap();
        assert!(req.validate().unwrap_err().field_errors().contains_key("hours"));

        let req: UpdateTimeEntryRequest =
            serde_json::from_str(r#"{"description": "notes only"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.hours.is_none());
    }
}
