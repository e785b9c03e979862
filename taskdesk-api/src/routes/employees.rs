/// Employee directory endpoints
///
/// - `GET    /v1/employees?department=` - List employees
/// - `POST   /v1/employees` - Create an employee without a password
/// - `GET    /v1/employees/:id` - Fetch one employee
/// - `PUT    /v1/employees/:id` - Partial profile update
/// - `DELETE /v1/employees/:id` - Soft delete

use crate::{
    app::AppState,
    error::{validate_request, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use taskdesk_shared::{
    employees::EmployeeProfile,
    models::employee::{Employee, EmployeeChanges},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListEmployeesQuery {
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 2, max = 255, message = "Name must be 2 to 255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Position must be at most 100 characters"))]
    pub position: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 2, max = 255, message = "Name must be 2 to 255 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: Option<String>,

    #[validate(length(max = 100, message = "Position must be at most 100 characters"))]
    pub position: Option<String>,
}

pub async fn list_employees(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListEmployeesQuery>,
) -> ApiResult<Json<Vec<Employee>>> {
    let employees = state.employees.list(query.department.as_deref()).await?;
    Ok(Json(employees))
}

/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn create_employee(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateEmployeeRequest>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    validate_request(&req)?;

    let employee = state
        .employees
        .create(EmployeeProfile {
            name: req.name,
            email: req.email,
            department: req.department,
            position: req.position,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn get_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(state.employees.get(id).await?))
}

pub async fn update_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateEmployeeRequest>,
) -> ApiResult<Json<Employee>> {
    validate_request(&req)?;

    let employee = state
        .employees
        .update(
            id,
            EmployeeChanges {
                name: req.name,
                department: req.department,
                position: req.position,
                email: req.email,
            },
        )
        .await?;

    Ok(Json(employee))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.employees.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
