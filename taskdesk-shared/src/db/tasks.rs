use super::{fetch_all, fetch_optional, scope::{Live, LiveUpdate}, PgStore};
use crate::models::{
    message::TaskMessage,
    participant::{NewParticipant, ParticipantRole, TaskParticipant},
    task::{NewTask, Task, TaskChanges, TaskFilter, TaskStatus},
};
use crate::store::{StoreError, StoreResult, TaskStore, TaskTransaction, TaskUnitOfWork};
use async_trait::async_trait;
use sqlx::{postgres::PgConnection, Postgres, Transaction};
use uuid::Uuid;

#[async_trait]
impl TaskStore for PgStore {
    async fn begin(&self) -> StoreResult<TaskTransaction> {
        let tx = self.pool.begin().await?;
        Ok(TaskTransaction::new(Box::new(PgUnitOfWork { tx: Some(tx) })))
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let mut query = Live::select("*", "tasks", "tasks");
        query.and_eq("id", id);
        fetch_optional(&self.pool, query).await
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let mut query = Live::select("*", "tasks", "tasks");
        if let Some(status) = filter.status {
            query.and_eq("status", status);
        }
        if let Some(archived) = filter.archived {
            query.and_eq("archived", archived);
        }
        query.push(" ORDER BY created_at DESC, id");
        fetch_all(&self.pool, query).await
    }

    async fn list_tasks_for_employee(&self, employee_id: Uuid) -> StoreResult<Vec<Task>> {
        let mut query = Live::select(
            "DISTINCT t.*",
            "tasks t JOIN task_participants p ON p.task_id = t.id",
            "t",
        );
        query
            .and_eq("p.employee_id", employee_id)
            .push(" ORDER BY t.created_at DESC, t.id");
        fetch_all(&self.pool, query).await
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        let mut update = LiveUpdate::table("tasks");
        if let Some(title) = changes.title {
            update.set("title", title);
        }
        if let Some(description) = changes.description {
            update.set("description", description);
        }
        if let Some(priority) = changes.priority {
            update.set("priority", priority);
        }
        if let Some(due_date) = changes.due_date {
            update.set("due_date", due_date);
        }

        let mut builder = update.where_id(id, " RETURNING *");
        Ok(builder
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_archived(&self, id: Uuid, archived: bool) -> StoreResult<Option<Task>> {
        let mut update = LiveUpdate::table("tasks");
        update.set("archived", archived);
        let mut builder = update.where_id(id, " RETURNING *");
        Ok(builder
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn soft_delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut update = LiveUpdate::table("tasks");
        update.set_now("deleted_at");
        let mut builder = update.where_id(id, "");
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_participant(
        &self,
        task_id: Uuid,
        participant: NewParticipant,
    ) -> StoreResult<TaskParticipant> {
        let row = sqlx::query_as::<_, TaskParticipant>(
            r#"
            INSERT INTO task_participants (task_id, employee_id, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(task_id)
        .bind(participant.employee_id)
        .bind(participant.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn remove_participant(
        &self,
        task_id: Uuid,
        employee_id: Uuid,
        role: ParticipantRole,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM task_participants WHERE task_id = $1 AND employee_id = $2 AND role = $3",
        )
        .bind(task_id)
        .bind(employee_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_participants(&self, task_id: Uuid) -> StoreResult<Vec<TaskParticipant>> {
        let rows = sqlx::query_as::<_, TaskParticipant>(
            "SELECT * FROM task_participants WHERE task_id = $1 ORDER BY created_at, role",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert_message(
        &self,
        task_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> StoreResult<TaskMessage> {
        let message = sqlx::query_as::<_, TaskMessage>(
            r#"
            INSERT INTO task_messages (task_id, author_id, content, is_system_message)
            VALUES ($1, $2, $3, FALSE)
            RETURNING *
            "#,
        )
        .bind(task_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn find_message(&self, id: Uuid) -> StoreResult<Option<TaskMessage>> {
        let mut query = Live::select("*", "task_messages", "task_messages");
        query.and_eq("id", id);
        fetch_optional(&self.pool, query).await
    }

    async fn update_message_content(
        &self,
        id: Uuid,
        content: String,
    ) -> StoreResult<Option<TaskMessage>> {
        let mut update = LiveUpdate::table("task_messages");
        update.set("content", content);
        let mut builder = update.where_id(
            id,
            " AND task_messages.is_system_message = FALSE RETURNING *",
        );
        Ok(builder
            .build_query_as::<TaskMessage>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn soft_delete_message(&self, id: Uuid) -> StoreResult<bool> {
        let mut update = LiveUpdate::table("task_messages");
        update.set_now("deleted_at");
        let mut builder = update.where_id(id, " AND task_messages.is_system_message = FALSE");
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_messages(&self, task_id: Uuid) -> StoreResult<Vec<TaskMessage>> {
        let mut query = Live::select("*", "task_messages", "task_messages");
        query
            .and_eq("task_id", task_id)
            .push(" ORDER BY created_at, id");
        fetch_all(&self.pool, query).await
    }
}

/// Unit of work over one PostgreSQL transaction
///
/// Dropping the `Transaction` without commit rolls it back.
struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> StoreResult<&mut PgConnection> {
        self.tx.as_deref_mut().ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!("transaction already committed"))
        })
    }
}

#[async_trait]
impl TaskUnitOfWork for PgUnitOfWork {
    async fn employee_exists(&mut self, id: Uuid) -> StoreResult<bool> {
        let mut query = Live::select("1", "employees", "employees");
        query.and_eq("id", id);
        let mut builder = query.into_builder();
        let found = builder
            .build_query_scalar::<i32>()
            .fetch_optional(self.conn()?)
            .await?;
        Ok(found.is_some())
    }

    async fn insert_task(&mut self, new: NewTask) -> StoreResult<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, priority, due_date, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.priority)
        .bind(new.due_date)
        .bind(new.created_by)
        .fetch_one(self.conn()?)
        .await?;

        Ok(task)
    }

    async fn insert_participant_if_absent(
        &mut self,
        task_id: Uuid,
        participant: NewParticipant,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO task_participants (task_id, employee_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (task_id, employee_id, role) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(participant.employee_id)
        .bind(participant.role)
        .execute(self.conn()?)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn lock_task_status(&mut self, task_id: Uuid) -> StoreResult<Option<TaskStatus>> {
        let mut query = Live::select("status", "tasks", "tasks");
        query.and_eq("id", task_id).push(" FOR UPDATE");
        let mut builder = query.into_builder();
        Ok(builder
            .build_query_scalar::<TaskStatus>()
            .fetch_optional(self.conn()?)
            .await?)
    }

    async fn set_task_status(&mut self, task_id: Uuid, status: TaskStatus) -> StoreResult<Task> {
        let mut update = LiveUpdate::table("tasks");
        update.set("status", status);
        let mut builder = update.where_id(task_id, " RETURNING *");
        Ok(builder
            .build_query_as::<Task>()
            .fetch_one(self.conn()?)
            .await?)
    }

    async fn append_system_message(
        &mut self,
        task_id: Uuid,
        content: String,
    ) -> StoreResult<TaskMessage> {
        let message = sqlx::query_as::<_, TaskMessage>(
            r#"
            INSERT INTO task_messages (task_id, author_id, content, is_system_message)
            VALUES ($1, NULL, $2, TRUE)
            RETURNING *
            "#,
        )
        .bind(task_id)
        .bind(content)
        .fetch_one(self.conn()?)
        .await?;

        Ok(message)
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let tx = self.tx.take().ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!("transaction already committed"))
        })?;
        tx.commit().await?;
        Ok(())
    }
}
