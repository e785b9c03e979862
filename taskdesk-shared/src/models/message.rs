/// Task message model
///
/// Messages form a task's log. System messages (`is_system_message`, no
/// author) record lifecycle events and are never edited or deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_messages (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     author_id UUID REFERENCES employees(id) ON DELETE SET NULL,
///     content TEXT NOT NULL,
///     is_system_message BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ,
///     CONSTRAINT task_messages_author_check CHECK (is_system_message OR author_id IS NOT NULL)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content of the message appended when a task is created
pub const TASK_CREATED_MESSAGE: &str = "Task created";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskMessage {
    pub id: Uuid,
    pub task_id: Uuid,
    /// `None` for system messages
    pub author_id: Option<Uuid>,
    pub content: String,
    pub is_system_message: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Content of the message appended when a task's status changes
pub fn status_changed_message(from: impl std::fmt::Display, to: impl std::fmt::Display) -> String {
    format!("Status changed from '{}' to '{}'", from, to)
}
