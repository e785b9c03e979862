/// Time entry model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE time_entries (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     employee_id UUID NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
///     hours DOUBLE PRECISION NOT NULL CHECK (hours > 0),
///     description TEXT,
///     entry_date DATE NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
///
/// CREATE VIEW task_time_summary AS ...; -- total_hours, entry_count, unique_employees per task
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub employee_id: Uuid,
    /// Strictly positive
    pub hours: f64,
    pub description: Option<String>,
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub task_id: Uuid,
    pub employee_id: Uuid,
    pub hours: f64,
    pub description: Option<String>,
    pub entry_date: NaiveDate,
}

/// Partial update of a time entry; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct TimeEntryChanges {
    pub hours: Option<f64>,
    pub description: Option<String>,
    pub entry_date: Option<NaiveDate>,
}

/// Inclusive bounds on `entry_date`; an open side is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// `from` after `to` can never match
    pub fn is_inverted(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }
}

/// Aggregated hours for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeSummary {
    pub task_id: Uuid,
    pub total_hours: f64,
    pub entry_count: i64,
    pub unique_employees: i64,
}

impl TimeSummary {
    /// Summary of a task with no entries
    pub fn empty(task_id: Uuid) -> Self {
        Self {
            task_id,
            total_hours: 0.0,
            entry_count: 0,
            unique_employees: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let range = DateRange {
            from: Some(day(2)),
            to: Some(day(4)),
        };
        assert!(!range.contains(day(1)));
        assert!(range.contains(day(2)));
        assert!(range.contains(day(4)));
        assert!(!range.contains(day(5)));

        assert!(DateRange::default().contains(day(1)));
        assert!(DateRange { from: Some(day(3)), to: None }.contains(day(30)));
    }

    #[test]
    fn test_inverted_range() {
        assert!(DateRange { from: Some(day(5)), to: Some(day(1)) }.is_inverted());
        assert!(!DateRange { from: Some(day(1)), to: Some(day(1)) }.is_inverted());
        assert!(!DateRange { from: None, to: Some(day(1)) }.is_inverted());
    }
}
