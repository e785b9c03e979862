/// Time tracking
///
/// Employees log hours against tasks; the per-task summary aggregates the
/// live entries.

use super::task_not_found;
use crate::error::{AppError, AppResult};
use crate::models::time_entry::{DateRange, NewTimeEntry, TimeEntry, TimeEntryChanges, TimeSummary};
use crate::store::{TaskStore, TimeEntryStore};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Hours to log; `entry_date` defaults to today (UTC)
#[derive(Debug, Clone)]
pub struct TimeLog {
    pub hours: f64,
    pub description: Option<String>,
    pub entry_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct TimeEntryService {
    entries: Arc<dyn TimeEntryStore>,
    tasks: Arc<dyn TaskStore>,
}

impl TimeEntryService {
    pub fn new(entries: Arc<dyn TimeEntryStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { entries, tasks }
    }

    /// # Errors
    ///
    /// - `BadRequest` unless `hours` is a finite positive number
    /// - `NotFound` if the task is absent
    pub async fn log(&self, task_id: Uuid, employee_id: Uuid, log: TimeLog) -> AppResult<TimeEntry> {
        check_hours(log.hours)?;
        self.ensure_task(task_id).await?;

        let entry = self
            .entries
            .insert_time_entry(NewTimeEntry {
                task_id,
                employee_id,
                hours: log.hours,
                description: log.description,
                entry_date: log.entry_date.unwrap_or_else(|| Utc::now().date_naive()),
            })
            .await?;

        tracing::info!(task_id = %task_id, employee_id = %employee_id, hours = entry.hours, "Time logged");
        Ok(entry)
    }

    pub async fn get(&self, entry_id: Uuid) -> AppResult<TimeEntry> {
        self.entries
            .find_time_entry(entry_id)
            .await?
            .ok_or_else(|| entry_not_found(entry_id))
    }

    /// Changes hours, description or date of a live entry
    ///
    /// # Errors
    ///
    /// - `BadRequest` if new hours are not a finite positive number
    /// - `NotFound` if the entry is absent
    pub async fn update(&self, entry_id: Uuid, changes: TimeEntryChanges) -> AppResult<TimeEntry> {
        if let Some(hours) = changes.hours {
            check_hours(hours)?;
        }

        let entry = self
            .entries
            .update_time_entry(entry_id, changes)
            .await?
            .ok_or_else(|| entry_not_found(entry_id))?;

        tracing::info!(entry_id = %entry_id, hours = entry.hours, "Time entry updated");
        Ok(entry)
    }

    /// Entries of a task, newest date first
    pub async fn list(&self, task_id: Uuid) -> AppResult<Vec<TimeEntry>> {
        self.ensure_task(task_id).await?;
        Ok(self.entries.list_time_entries(task_id).await?)
    }

    /// Entries an employee logged across all tasks, newest date first
    ///
    /// # Errors
    ///
    /// `BadRequest` if `range.from` is after `range.to`.
    pub async fn list_for_employee(
        &self,
        employee_id: Uuid,
        range: DateRange,
    ) -> AppResult<Vec<TimeEntry>> {
        if range.is_inverted() {
            return Err(AppError::BadRequest(
                "start date must not be after end date".to_string(),
            ));
        }
        Ok(self
            .entries
            .list_time_entries_for_employee(employee_id, range)
            .await?)
    }

    pub async fn summary(&self, task_id: Uuid) -> AppResult<TimeSummary> {
        self.ensure_task(task_id).await?;
        Ok(self.entries.time_summary(task_id).await?)
    }

    pub async fn delete(&self, entry_id: Uuid) -> AppResult<()> {
        if !self.entries.soft_delete_time_entry(entry_id).await? {
            return Err(entry_not_found(entry_id));
        }
        Ok(())
    }

    async fn ensure_task(&self, task_id: Uuid) -> AppResult<()> {
        self.tasks
            .find_task(task_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| task_not_found(task_id))
    }
}

fn check_hours(hours: f64) -> AppResult<()> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(AppError::BadRequest("hours must be positive".to_string()));
    }
    Ok(())
}

fn entry_not_found(entry_id: Uuid) -> AppError {
    AppError::NotFound(format!("time entry {} not found", entry_id))
}
