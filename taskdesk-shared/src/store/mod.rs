/// Storage traits
///
/// Services talk to storage only through these traits. Two gateways implement
/// all of them:
///
/// - [`crate::db::PgStore`]: PostgreSQL via sqlx (production)
/// - [`memory::MemoryStore`]: in-process maps (tests and local runs)
///
/// # Soft Delete
///
/// Every read excludes soft-deleted rows. A soft-deleted row behaves exactly
/// like an absent one: lookups return `None`, updates affect nothing.
///
/// # Units of Work
///
/// Compound task writes go through [`TaskTransaction`], obtained from
/// [`TaskStore::begin`]. Nothing written through it is visible until
/// [`TaskTransaction::commit`]; dropping it without committing discards every
/// write.
///
/// # Example
///
/// ```
/// use taskdesk_shared::models::task::NewTask;
/// use taskdesk_shared::store::{memory::MemoryStore, TaskStore};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let mut tx = store.begin().await?;
/// let task = tx
///     .insert_task(NewTask {
///         title: "Draft".to_string(),
///         description: String::new(),
///         priority: 0,
///         due_date: None,
///         created_by: Uuid::new_v4(),
///     })
///     .await?;
/// drop(tx);
///
/// assert!(store.find_task(task.id).await?.is_none());
/// # Ok(())
/// # }
/// ```

pub mod memory;

use crate::models::{
    employee::{Employee, EmployeeChanges, NewEmployee},
    message::TaskMessage,
    participant::{NewParticipant, ParticipantRole, TaskParticipant},
    session::{NewRefreshSession, RefreshSession},
    task::{NewTask, Task, TaskChanges, TaskFilter, TaskStatus},
    time_entry::{DateRange, NewTimeEntry, TimeEntry, TimeEntryChanges, TimeSummary},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Any other backend failure
    #[error("storage backend failure: {0}")]
    Backend(#[source] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        StoreError::Backend(anyhow::Error::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Employee persistence
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Fails with `UniqueViolation` if a live employee has the same email
    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee>;

    async fn find_employee(&self, id: Uuid) -> StoreResult<Option<Employee>>;

    async fn find_employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>>;

    /// Ordered by name
    async fn list_employees(&self, department: Option<&str>) -> StoreResult<Vec<Employee>>;

    async fn update_employee(
        &self,
        id: Uuid,
        changes: EmployeeChanges,
    ) -> StoreResult<Option<Employee>>;

    async fn soft_delete_employee(&self, id: Uuid) -> StoreResult<bool>;
}

/// Refresh session persistence
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert_session(&self, new: NewRefreshSession) -> StoreResult<RefreshSession>;

    async fn find_session_by_digest(&self, digest: &str) -> StoreResult<Option<RefreshSession>>;

    /// Revokes a session that is not yet revoked; `false` if there was none
    async fn revoke_session(&self, digest: &str, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Revokes a session only if it is still valid at `at`, returning it
    ///
    /// Two concurrent callers with the same digest: exactly one gets `Some`.
    async fn consume_session(
        &self,
        digest: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<RefreshSession>>;

    /// Revokes every unrevoked session of an employee, returning the count
    async fn revoke_all_sessions(&self, employee_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64>;

    /// Deletes sessions expired before `now` or revoked before `revoked_before`
    async fn delete_expired_sessions(
        &self,
        now: DateTime<Utc>,
        revoked_before: DateTime<Utc>,
    ) -> StoreResult<u64>;
}

/// Task, participant and message persistence
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Opens a unit of work for compound writes
    async fn begin(&self) -> StoreResult<TaskTransaction>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Newest first
    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>>;

    /// Tasks the employee participates in under any role, newest first
    async fn list_tasks_for_employee(&self, employee_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>>;

    async fn set_archived(&self, id: Uuid, archived: bool) -> StoreResult<Option<Task>>;

    async fn soft_delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Fails with `UniqueViolation` on a duplicate (task, employee, role)
    async fn insert_participant(
        &self,
        task_id: Uuid,
        participant: NewParticipant,
    ) -> StoreResult<TaskParticipant>;

    async fn remove_participant(
        &self,
        task_id: Uuid,
        employee_id: Uuid,
        role: ParticipantRole,
    ) -> StoreResult<bool>;

    async fn list_participants(&self, task_id: Uuid) -> StoreResult<Vec<TaskParticipant>>;

    /// Appends a user-authored message
    async fn insert_message(
        &self,
        task_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> StoreResult<TaskMessage>;

    async fn find_message(&self, id: Uuid) -> StoreResult<Option<TaskMessage>>;

    /// Updates a user message; system messages are never matched
    async fn update_message_content(
        &self,
        id: Uuid,
        content: String,
    ) -> StoreResult<Option<TaskMessage>>;

    /// Soft-deletes a user message; system messages are never matched
    async fn soft_delete_message(&self, id: Uuid) -> StoreResult<bool>;

    /// Oldest first
    async fn list_messages(&self, task_id: Uuid) -> StoreResult<Vec<TaskMessage>>;
}

/// Time entry persistence
#[async_trait]
pub trait TimeEntryStore: Send + Sync {
    async fn insert_time_entry(&self, new: NewTimeEntry) -> StoreResult<TimeEntry>;

    async fn find_time_entry(&self, id: Uuid) -> StoreResult<Option<TimeEntry>>;

    async fn update_time_entry(
        &self,
        id: Uuid,
        changes: TimeEntryChanges,
    ) -> StoreResult<Option<TimeEntry>>;

    /// Newest entry date first
    async fn list_time_entries(&self, task_id: Uuid) -> StoreResult<Vec<TimeEntry>>;

    /// Entries of one employee across tasks within `range`, newest entry date first
    async fn list_time_entries_for_employee(
        &self,
        employee_id: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<TimeEntry>>;

    /// Zeros for a task without entries
    async fn time_summary(&self, task_id: Uuid) -> StoreResult<TimeSummary>;

    async fn soft_delete_time_entry(&self, id: Uuid) -> StoreResult<bool>;
}

/// Writes performed inside one atomic unit
///
/// Implementations must roll back when dropped without [`commit`](Self::commit).
/// The unit of work is unusable after `commit`.
#[async_trait]
pub trait TaskUnitOfWork: Send {
    async fn employee_exists(&mut self, id: Uuid) -> StoreResult<bool>;

    async fn insert_task(&mut self, new: NewTask) -> StoreResult<Task>;

    /// Inserts the participant unless the same triple exists; `true` if inserted
    async fn insert_participant_if_absent(
        &mut self,
        task_id: Uuid,
        participant: NewParticipant,
    ) -> StoreResult<bool>;

    /// Reads a live task's status and holds it against concurrent writers
    /// until the unit ends
    async fn lock_task_status(&mut self, task_id: Uuid) -> StoreResult<Option<TaskStatus>>;

    async fn set_task_status(&mut self, task_id: Uuid, status: TaskStatus) -> StoreResult<Task>;

    async fn append_system_message(
        &mut self,
        task_id: Uuid,
        content: String,
    ) -> StoreResult<TaskMessage>;

    async fn commit(&mut self) -> StoreResult<()>;
}

/// Owned handle to a unit of work; committing consumes it
pub struct TaskTransaction {
    inner: Box<dyn TaskUnitOfWork>,
}

impl TaskTransaction {
    pub fn new(inner: Box<dyn TaskUnitOfWork>) -> Self {
        Self { inner }
    }

    pub async fn employee_exists(&mut self, id: Uuid) -> StoreResult<bool> {
        self.inner.employee_exists(id).await
    }

    pub async fn insert_task(&mut self, new: NewTask) -> StoreResult<Task> {
        self.inner.insert_task(new).await
    }

    pub async fn insert_participant_if_absent(
        &mut self,
        task_id: Uuid,
        participant: NewParticipant,
    ) -> StoreResult<bool> {
        self.inner
            .insert_participant_if_absent(task_id, participant)
            .await
    }

    pub async fn lock_task_status(&mut self, task_id: Uuid) -> StoreResult<Option<TaskStatus>> {
        self.inner.lock_task_status(task_id).await
    }

    pub async fn set_task_status(&mut self, task_id: Uuid, status: TaskStatus) -> StoreResult<Task> {
        self.inner.set_task_status(task_id, status).await
    }

    pub async fn append_system_message(
        &mut self,
        task_id: Uuid,
        content: impl Into<String>,
    ) -> StoreResult<TaskMessage> {
        self.inner.append_system_message(task_id, content.into()).await
    }

    /// Makes every write visible at once
    pub async fn commit(mut self) -> StoreResult<()> {
        self.inner.commit().await
    }
}
