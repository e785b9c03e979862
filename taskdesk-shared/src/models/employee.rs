/// Employee model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE employees (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     department VARCHAR(255) NOT NULL DEFAULT '',
///     position VARCHAR(255) NOT NULL DEFAULT '',
///     email VARCHAR(255) NOT NULL,
///     password_hash TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
///
/// CREATE UNIQUE INDEX employees_email_live_idx ON employees (email) WHERE deleted_at IS NULL;
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: Uuid,

    pub name: String,

    pub department: String,

    pub position: String,

    /// Unique among non-deleted employees
    pub email: String,

    /// Argon2id PHC string; `None` for administratively created employees
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating an employee
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub department: String,
    pub position: String,
    pub email: String,
    pub password_hash: Option<String>,
}

/// Partial profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.department.is_none()
            && self.position.is_none()
            && self.email.is_none()
    }
}
