/// Task participant model
///
/// # Schema
///
/// ```sql
/// CREATE TYPE participant_role AS ENUM ('executor', 'responsible', 'customer');
///
/// CREATE TABLE task_participants (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     employee_id UUID NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
///     role participant_role NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT task_participants_unique UNIQUE (task_id, employee_id, role)
/// );
/// ```

use super::UnknownVariant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Role an employee holds on a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participant_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Executor,
    Responsible,
    Customer,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Executor => "executor",
            ParticipantRole::Responsible => "responsible",
            ParticipantRole::Customer => "customer",
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "executor" => Ok(ParticipantRole::Executor),
            "responsible" => Ok(ParticipantRole::Responsible),
            "customer" => Ok(ParticipantRole::Customer),
            other => Err(UnknownVariant {
                kind: "participant role",
                value: other.to_string(),
            }),
        }
    }
}

/// An employee's role on a task; (task, employee, role) is unique
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskParticipant {
    pub id: Uuid,
    pub task_id: Uuid,
    pub employee_id: Uuid,
    pub role: ParticipantRole,
    pub created_at: DateTime<Utc>,
}

/// Requested participant for a new task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewParticipant {
    pub employee_id: Uuid,
    pub role: ParticipantRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("executor".parse(), Ok(ParticipantRole::Executor));
        assert_eq!("responsible".parse(), Ok(ParticipantRole::Responsible));
        assert_eq!("customer".parse(), Ok(ParticipantRole::Customer));

        let err = "owner".parse::<ParticipantRole>().unwrap_err();
        assert_eq!(err.to_string(), "invalid participant role 'owner'");
    }
}
