/// Task lifecycle engine
///
/// [`TaskService`] owns every write that has to stay consistent with the
/// task's message log:
///
/// - **create**: task, participants and the `Task created` message in one unit
/// - **transition**: lock the row, write the status, log the change in one unit
///
/// Plain field updates, archiving and participant edits are single writes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskdesk_shared::models::{employee::NewEmployee, task::TaskStatus};
/// use taskdesk_shared::store::{memory::MemoryStore, EmployeeStore};
/// use taskdesk_shared::tasks::{TaskDraft, TaskService};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let creator = store
///     .insert_employee(NewEmployee {
///         name: "Ada".to_string(),
///         department: String::new(),
///         position: String::new(),
///         email: "ada@example.com".to_string(),
///         password_hash: None,
///     })
///     .await?;
///
/// let tasks = TaskService::new(Arc::new(store.clone()), Arc::new(store));
/// let task = tasks.create_task(creator.id, TaskDraft::titled("Ship it")).await?;
/// let task = tasks.transition_status(task.id, "in_progress").await?;
/// assert_eq!(task.status, TaskStatus::InProgress);
/// # Ok(())
/// # }
/// ```

pub mod messages;
pub mod time_entries;

pub use messages::MessageService;
pub use time_entries::{TimeEntryService, TimeLog};

use crate::error::{AppError, AppResult};
use crate::models::{
    message::{status_changed_message, TASK_CREATED_MESSAGE},
    participant::{NewParticipant, ParticipantRole, TaskParticipant},
    task::{NewTask, Task, TaskChanges, TaskFilter, TaskStatus},
};
use crate::store::{EmployeeStore, StoreError, TaskStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub participants: Vec<NewParticipant>,
}

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    employees: Arc<dyn EmployeeStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, employees: Arc<dyn EmployeeStore>) -> Self {
        Self { store, employees }
    }

    /// Creates a task in `new` with its participants and opening message
    ///
    /// Duplicate participants in the draft are inserted once.
    ///
    /// # Errors
    ///
    /// `BadRequest` if the creator or any participant does not exist; nothing
    /// is written in that case.
    pub async fn create_task(&self, created_by: Uuid, draft: TaskDraft) -> AppResult<Task> {
        let mut tx = self.store.begin().await?;

        if !tx.employee_exists(created_by).await? {
            return Err(AppError::BadRequest(format!(
                "creator {} does not exist",
                created_by
            )));
        }

        let task = tx
            .insert_task(NewTask {
                title: draft.title,
                description: draft.description,
                priority: draft.priority,
                due_date: draft.due_date,
                created_by,
            })
            .await?;

        for participant in draft.participants {
            if !tx.employee_exists(participant.employee_id).await? {
                // Dropping `tx` discards the task row as well
                return Err(AppError::BadRequest(format!(
                    "employee {} does not exist",
                    participant.employee_id
                )));
            }
            tx.insert_participant_if_absent(task.id, participant).await?;
        }

        tx.append_system_message(task.id, TASK_CREATED_MESSAGE).await?;
        tx.commit().await?;

        tracing::info!(task_id = %task.id, created_by = %created_by, "Task created");
        Ok(task)
    }

    /// Moves a task to `status`, logging the change
    ///
    /// Any status may follow any other. Setting the current status again
    /// writes no message.
    ///
    /// # Errors
    ///
    /// - `BadRequest` for an unknown status name
    /// - `NotFound` if the task is absent or deleted
    pub async fn transition_status(&self, task_id: Uuid, status: &str) -> AppResult<Task> {
        let next: TaskStatus = status
            .parse()
            .map_err(|e: crate::models::UnknownVariant| AppError::BadRequest(e.to_string()))?;

        let mut tx = self.store.begin().await?;
        let current = tx
            .lock_task_status(task_id)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;

        let task = tx.set_task_status(task_id, next).await?;
        if current != next {
            tx.append_system_message(task_id, status_changed_message(current, next))
                .await?;
        }
        tx.commit().await?;

        if current != next {
            tracing::info!(task_id = %task_id, from = %current, to = %next, "Task status changed");
        }
        Ok(task)
    }

    /// Sets the archived flag; no message is logged
    pub async fn archive(&self, task_id: Uuid) -> AppResult<Task> {
        let task = self
            .store
            .set_archived(task_id, true)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;

        tracing::info!(task_id = %task_id, "Task archived");
        Ok(task)
    }

    /// # Errors
    ///
    /// - `BadRequest` for an unknown role or a missing employee
    /// - `NotFound` if the task is absent
    /// - `Conflict` if the employee already has this role on the task
    pub async fn add_participant(
        &self,
        task_id: Uuid,
        employee_id: Uuid,
        role: &str,
    ) -> AppResult<TaskParticipant> {
        let role = parse_role(role)?;
        self.get_task(task_id).await?;

        if self.employees.find_employee(employee_id).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "employee {} does not exist",
                employee_id
            )));
        }

        let participant = self
            .store
            .insert_participant(task_id, NewParticipant { employee_id, role })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation { .. } => AppError::Conflict(format!(
                    "employee {} is already {} of this task",
                    employee_id, role
                )),
                other => other.into(),
            })?;

        tracing::info!(task_id = %task_id, employee_id = %employee_id, role = %role, "Participant added");
        Ok(participant)
    }

    pub async fn remove_participant(
        &self,
        task_id: Uuid,
        employee_id: Uuid,
        role: &str,
    ) -> AppResult<()> {
        let role = parse_role(role)?;
        if !self.store.remove_participant(task_id, employee_id, role).await? {
            return Err(AppError::NotFound(format!(
                "employee {} is not {} of task {}",
                employee_id, role, task_id
            )));
        }

        tracing::info!(task_id = %task_id, employee_id = %employee_id, role = %role, "Participant removed");
        Ok(())
    }

    pub async fn list_participants(&self, task_id: Uuid) -> AppResult<Vec<TaskParticipant>> {
        self.get_task(task_id).await?;
        Ok(self.store.list_participants(task_id).await?)
    }

    pub async fn get_task(&self, task_id: Uuid) -> AppResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or_else(|| task_not_found(task_id))
    }

    pub async fn list_tasks(&self, filter: TaskFilter) -> AppResult<Vec<Task>> {
        Ok(self.store.list_tasks(filter).await?)
    }

    /// Tasks an employee participates in under any role
    pub async fn list_tasks_for_employee(&self, employee_id: Uuid) -> AppResult<Vec<Task>> {
        if self.employees.find_employee(employee_id).await?.is_none() {
            return Err(AppError::NotFound(format!("employee {} not found", employee_id)));
        }
        Ok(self.store.list_tasks_for_employee(employee_id).await?)
    }

    /// Updates descriptive fields; the status is untouched
    pub async fn update_task(&self, task_id: Uuid, changes: TaskChanges) -> AppResult<Task> {
        self.store
            .update_task(task_id, changes)
            .await?
            .ok_or_else(|| task_not_found(task_id))
    }

    pub async fn delete_task(&self, task_id: Uuid) -> AppResult<()> {
        if !self.store.soft_delete_task(task_id).await? {
            return Err(task_not_found(task_id));
        }
        tracing::info!(task_id = %task_id, "Task deleted");
        Ok(())
    }
}

fn parse_role(role: &str) -> AppResult<ParticipantRole> {
    role.parse()
        .map_err(|e: crate::models::UnknownVariant| AppError::BadRequest(e.to_string()))
}

pub(crate) fn task_not_found(task_id: Uuid) -> AppError {
    AppError::NotFound(format!("task {} not found", task_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee::{Employee, NewEmployee};
    use crate::store::memory::MemoryStore;

    struct Fixture {
        memory: MemoryStore,
        tasks: TaskService,
        messages: MessageService,
    }

    fn fixture() -> Fixture {
        let memory = MemoryStore::new();
        Fixture {
            tasks: TaskService::new(Arc::new(memory.clone()), Arc::new(memory.clone())),
            messages: MessageService::new(Arc::new(memory.clone())),
            memory,
        }
    }

    async fn employee(memory: &MemoryStore, email: &str) -> Employee {
        memory
            .insert_employee(NewEmployee {
                name: email.to_string(),
                department: "Eng".to_string(),
                position: "Dev".to_string(),
                email: email.to_string(),
                password_hash: None,
            })
            .await
            .unwrap()
    }

    fn participant(employee_id: Uuid, role: ParticipantRole) -> NewParticipant {
        NewParticipant { employee_id, role }
    }

    async fn contents(fx: &Fixture, task_id: Uuid) -> Vec<String> {
        fx.messages
            .list(task_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect()
    }

    #[tokio::test]
    async fn test_create_writes_task_participants_and_message() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let executor = employee(&fx.memory, "e@x.com").await;

        let mut draft = TaskDraft::titled("Build");
        draft.participants = vec![
            participant(executor.id, ParticipantRole::Executor),
            participant(creator.id, ParticipantRole::Customer),
            participant(executor.id, ParticipantRole::Executor),
        ];
        let task = fx.tasks.create_task(creator.id, draft).await.unwrap();

        assert_eq!(task.status, TaskStatus::New);
        assert!(!task.archived);
        assert_eq!(fx.tasks.list_participants(task.id).await.unwrap().len(), 2);

        let log = fx.messages.list(task.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].content, TASK_CREATED_MESSAGE);
        assert!(log[0].is_system_message);
        assert!(log[0].author_id.is_none());
    }

    #[tokio::test]
    async fn test_create_with_missing_participant_writes_nothing() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let executor = employee(&fx.memory, "e@x.com").await;
        let ghost = Uuid::new_v4();

        let mut draft = TaskDraft::titled("Doomed");
        draft.participants = vec![
            participant(executor.id, ParticipantRole::Executor),
            participant(ghost, ParticipantRole::Responsible),
        ];
        let result = fx.tasks.create_task(creator.id, draft).await;

        match result {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains(&ghost.to_string())),
            other => panic!("expected bad request, got {:?}", other.map(|t| t.id)),
        }
        assert_eq!(fx.memory.task_count().await, 0);
        assert_eq!(fx.memory.participant_count().await, 0);
        assert!(fx.tasks.list_tasks(TaskFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_missing_creator_is_bad_request() {
        let fx = fixture();
        let result = fx
            .tasks
            .create_task(Uuid::new_v4(), TaskDraft::titled("Orphan"))
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(fx.memory.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_transitions_log_exactly_the_changes() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let task = fx
            .tasks
            .create_task(creator.id, TaskDraft::titled("Flow"))
            .await
            .unwrap();

        let moved = fx.tasks.transition_status(task.id, "in_progress").await.unwrap();
        assert_eq!(moved.status, TaskStatus::InProgress);
        fx.tasks.transition_status(task.id, "new").await.unwrap();

        assert_eq!(
            contents(&fx, task.id).await,
            vec![
                "Task created".to_string(),
                "Status changed from 'new' to 'in_progress'".to_string(),
                "Status changed from 'in_progress' to 'new'".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_same_status_transition_logs_nothing() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let task = fx
            .tasks
            .create_task(creator.id, TaskDraft::titled("Idle"))
            .await
            .unwrap();

        let same = fx.tasks.transition_status(task.id, "new").await.unwrap();
        assert_eq!(same.status, TaskStatus::New);
        assert_eq!(fx.memory.message_count(task.id).await, 1);
    }

    #[tokio::test]
    async fn test_any_status_may_follow_any_other() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let task = fx
            .tasks
            .create_task(creator.id, TaskDraft::titled("Loop"))
            .await
            .unwrap();

        for status in ["closed", "returned_with_errors", "testing", "code_review", "new"] {
            let task = fx.tasks.transition_status(task.id, status).await.unwrap();
            assert_eq!(task.status.as_str(), status);
        }
        assert_eq!(fx.memory.message_count(task.id).await, 6);
    }

    #[tokio::test]
    async fn test_transition_errors() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let task = fx
            .tasks
            .create_task(creator.id, TaskDraft::titled("Errors"))
            .await
            .unwrap();

        assert!(matches!(
            fx.tasks.transition_status(task.id, "done").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            fx.tasks.transition_status(Uuid::new_v4(), "closed").await,
            Err(AppError::NotFound(_))
        ));
        fx.tasks.delete_task(task.id).await.unwrap();
        assert!(matches!(
            fx.tasks.transition_status(task.id, "closed").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_transitions_serialize() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let task = fx
            .tasks
            .create_task(creator.id, TaskDraft::titled("Race"))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            fx.tasks.transition_status(task.id, "in_progress"),
            fx.tasks.transition_status(task.id, "testing"),
        );
        a.unwrap();
        b.unwrap();

        // Each transition saw the other's result, so both were logged
        let log = contents(&fx, task.id).await;
        assert_eq!(log.len(), 3);
        assert!(log[1].starts_with("Status changed from 'new'"));
        assert!(!log[2].starts_with("Status changed from 'new'"));
    }

    #[tokio::test]
    async fn test_archive() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let task = fx
            .tasks
            .create_task(creator.id, TaskDraft::titled("Old"))
            .await
            .unwrap();

        let archived = fx.tasks.archive(task.id).await.unwrap();
        assert!(archived.archived);
        assert_eq!(archived.status, TaskStatus::New);
        assert_eq!(fx.memory.message_count(task.id).await, 1);

        let filter = TaskFilter {
            archived: Some(false),
            ..Default::default()
        };
        assert!(fx.tasks.list_tasks(filter).await.unwrap().is_empty());
        assert!(matches!(
            fx.tasks.archive(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_participant_management() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let member = employee(&fx.memory, "m@x.com").await;
        let task = fx
            .tasks
            .create_task(creator.id, TaskDraft::titled("Team"))
            .await
            .unwrap();

        fx.tasks
            .add_participant(task.id, member.id, "responsible")
            .await
            .unwrap();
        assert!(matches!(
            fx.tasks.add_participant(task.id, member.id, "responsible").await,
            Err(AppError::Conflict(_))
        ));
        // Same employee, different role
        fx.tasks
            .add_participant(task.id, member.id, "executor")
            .await
            .unwrap();

        assert!(matches!(
            fx.tasks.add_participant(task.id, member.id, "owner").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            fx.tasks.add_participant(task.id, Uuid::new_v4(), "executor").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            fx.tasks.add_participant(Uuid::new_v4(), member.id, "executor").await,
            Err(AppError::NotFound(_))
        ));

        let member_tasks = fx.tasks.list_tasks_for_employee(member.id).await.unwrap();
        assert_eq!(member_tasks.len(), 1);

        fx.tasks
            .remove_participant(task.id, member.id, "responsible")
            .await
            .unwrap();
        assert!(matches!(
            fx.tasks.remove_participant(task.id, member.id, "responsible").await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(fx.tasks.list_participants(task.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_never_changes_status() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let task = fx
            .tasks
            .create_task(creator.id, TaskDraft::titled("Draft"))
            .await
            .unwrap();
        fx.tasks.transition_status(task.id, "testing").await.unwrap();

        let updated = fx
            .tasks
            .update_task(
                task.id,
                TaskChanges {
                    title: Some("Final".to_string()),
                    priority: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.priority, 3);
        assert_eq!(updated.status, TaskStatus::Testing);
    }

    #[tokio::test]
    async fn test_deleted_task_is_not_found() {
        let fx = fixture();
        let creator = employee(&fx.memory, "c@x.com").await;
        let task = fx
            .tasks
            .create_task(creator.id, TaskDraft::titled("Gone"))
            .await
            .unwrap();

        fx.tasks.delete_task(task.id).await.unwrap();

        assert!(matches!(fx.tasks.get_task(task.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(fx.tasks.delete_task(task.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            fx.tasks.update_task(task.id, TaskChanges::default()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
