/// Employee directory
///
/// Administrative CRUD over employees. Employees created here have no
/// password and cannot log in until they register under the same email
/// after this record is deleted.

use crate::error::{AppError, AppResult};
use crate::models::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::store::EmployeeStore;
use std::sync::Arc;
use uuid::Uuid;

/// Input for administratively creating an employee
#[derive(Debug, Clone)]
pub struct EmployeeProfile {
    pub name: String,
    pub email: String,
    pub department: String,
    pub position: String,
}

#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Employee> {
        self.store
            .find_employee(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Employees ordered by name, optionally limited to one department
    pub async fn list(&self, department: Option<&str>) -> AppResult<Vec<Employee>> {
        Ok(self.store.list_employees(department).await?)
    }

    /// # Errors
    ///
    /// `Conflict` if a live employee already has the email.
    pub async fn create(&self, profile: EmployeeProfile) -> AppResult<Employee> {
        let employee = self
            .store
            .insert_employee(NewEmployee {
                name: profile.name,
                department: profile.department,
                position: profile.position,
                email: profile.email,
                password_hash: None,
            })
            .await?;

        tracing::info!(employee_id = %employee.id, "Employee created");
        Ok(employee)
    }

    /// Applies a partial profile update
    ///
    /// # Errors
    ///
    /// - `NotFound` if the employee is absent or deleted
    /// - `Conflict` if the new email belongs to another live employee
    pub async fn update(&self, id: Uuid, changes: EmployeeChanges) -> AppResult<Employee> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        let employee = self
            .store
            .update_employee(id, changes)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(employee_id = %id, "Employee updated");
        Ok(employee)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.soft_delete_employee(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(employee_id = %id, "Employee deleted");
        Ok(())
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("employee {} not found", id))
}
