/// Task model
///
/// # Status
///
/// ```text
/// new, in_progress, code_review, testing, returned_with_errors, closed
/// ```
///
/// Any status may move to any other; every real change is recorded as a
/// system message (see [`crate::tasks::TaskService::transition_status`]).
/// `archived` is a separate flag and is not part of the status.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM (
///     'new', 'in_progress', 'code_review', 'testing', 'returned_with_errors', 'closed'
/// );
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'new',
///     priority INTEGER NOT NULL DEFAULT 0,
///     created_by UUID NOT NULL REFERENCES employees(id),
///     archived BOOLEAN NOT NULL DEFAULT FALSE,
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use super::UnknownVariant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    InProgress,
    CodeReview,
    Testing,
    ReturnedWithErrors,
    Closed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::New,
        TaskStatus::InProgress,
        TaskStatus::CodeReview,
        TaskStatus::Testing,
        TaskStatus::ReturnedWithErrors,
        TaskStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::CodeReview => "code_review",
            TaskStatus::Testing => "testing",
            TaskStatus::ReturnedWithErrors => "returned_with_errors",
            TaskStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "task status",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    pub description: String,

    pub status: TaskStatus,

    /// Higher means more urgent
    pub priority: i32,

    /// Employee who created the task
    pub created_by: Uuid,

    pub archived: bool,

    pub due_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for inserting a task; status always starts at `new`
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: Uuid,
}

/// Partial task update; status is changed only through a transition
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Optional filters for listing tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub archived: Option<bool>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |status| task.status == status)
            && self.archived.map_or(true, |archived| task.archived == archived)
    }
}
