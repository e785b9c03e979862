use super::{fetch_all, fetch_optional, scope::{Live, LiveUpdate}, PgStore};
use crate::models::time_entry::{DateRange, NewTimeEntry, TimeEntry, TimeEntryChanges, TimeSummary};
use crate::store::{StoreResult, TimeEntryStore};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
impl TimeEntryStore for PgStore {
    async fn insert_time_entry(&self, new: NewTimeEntry) -> StoreResult<TimeEntry> {
        let entry = sqlx::query_as::<_, TimeEntry>(
            r#"
            INSERT INTO time_entries (task_id, employee_id, hours, description, entry_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.task_id)
        .bind(new.employee_id)
        .bind(new.hours)
        .bind(new.description)
        .bind(new.entry_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn find_time_entry(&self, id: Uuid) -> StoreResult<Option<TimeEntry>> {
        let mut query = Live::select("*", "time_entries", "time_entries");
        query.and_eq("id", id);
        fetch_optional(&self.pool, query).await
    }

    async fn update_time_entry(
        &self,
        id: Uuid,
        changes: TimeEntryChanges,
    ) -> StoreResult<Option<TimeEntry>> {
        let mut update = LiveUpdate::table("time_entries");
        if let Some(hours) = changes.hours {
            update.set("hours", hours);
        }
        if let Some(description) = changes.description {
            update.set("description", description);
        }
        if let Some(entry_date) = changes.entry_date {
            update.set("entry_date", entry_date);
        }

        let mut builder = update.where_id(id, " RETURNING *");
        Ok(builder
            .build_query_as::<TimeEntry>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_time_entries(&self, task_id: Uuid) -> StoreResult<Vec<TimeEntry>> {
        let mut query = Live::select("*", "time_entries", "time_entries");
        query
            .and_eq("task_id", task_id)
            .push(" ORDER BY entry_date DESC, created_at DESC");
        fetch_all(&self.pool, query).await
    }

    async fn list_time_entries_for_employee(
        &self,
        employee_id: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<TimeEntry>> {
        let mut query = Live::select("*", "time_entries", "time_entries");
        query.and_eq("employee_id", employee_id);
        if let Some(from) = range.from {
            query.and_cmp("entry_date", ">=", from);
        }
        if let Some(to) = range.to {
            query.and_cmp("entry_date", "<=", to);
        }
        query.push(" ORDER BY entry_date DESC, created_at DESC");
        fetch_all(&self.pool, query).await
    }

    async fn time_summary(&self, task_id: Uuid) -> StoreResult<TimeSummary> {
        // The view only aggregates live entries
        let summary = sqlx::query_as::<_, TimeSummary>(
            r#"
            SELECT task_id, total_hours, entry_count, unique_employees
            FROM task_time_summary
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(summary.unwrap_or_else(|| TimeSummary::empty(task_id)))
    }

    async fn soft_delete_time_entry(&self, id: Uuid) -> StoreResult<bool> {
        let mut update = LiveUpdate::table("time_entries");
        update.set_now("deleted_at");
        let mut builder = update.where_id(id, "");
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
