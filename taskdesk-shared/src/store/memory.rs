/// In-memory storage gateway
///
/// [`MemoryStore`] implements every storage trait over plain collections
/// behind one async mutex. It enforces the same uniqueness rules and
/// soft-delete visibility as the PostgreSQL schema, which makes it suitable
/// for service tests and for running the API without a database.
///
/// A unit of work holds the mutex for its whole lifetime and writes to a
/// staged copy of the state. Commit swaps the copy in; drop throws it away.

use super::{
    EmployeeStore, SessionRepository, StoreError, StoreResult, TaskStore, TaskTransaction,
    TaskUnitOfWork, TimeEntryStore,
};
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
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

const EMPLOYEE_EMAIL_CONSTRAINT: &str = "employees_email_live_idx";
const SESSION_DIGEST_CONSTRAINT: &str = "refresh_sessions_token_digest_key";
const PARTICIPANT_CONSTRAINT: &str = "task_participants_unique";

#[derive(Debug, Clone, Default)]
struct MemoryState {
    employees: Vec<Employee>,
    sessions: Vec<RefreshSession>,
    tasks: Vec<Task>,
    participants: Vec<TaskParticipant>,
    messages: Vec<TaskMessage>,
    time_entries: Vec<TimeEntry>,
}

impl MemoryState {
    fn live_employee(&self, id: Uuid) -> Option<&Employee> {
        self.employees
            .iter()
            .find(|e| e.id == id && e.deleted_at.is_none())
    }

    fn live_employee_mut(&mut self, id: Uuid) -> Option<&mut Employee> {
        self.employees
            .iter_mut()
            .find(|e| e.id == id && e.deleted_at.is_none())
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.employees.iter().any(|e| {
            e.deleted_at.is_none() && e.email == email && Some(e.id) != except
        })
    }

    fn live_task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id && t.deleted_at.is_none())
    }

    fn live_task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id && t.deleted_at.is_none())
    }

    fn user_message_mut(&mut self, id: Uuid) -> Option<&mut TaskMessage> {
        self.messages
            .iter_mut()
            .find(|m| m.id == id && m.deleted_at.is_none() && !m.is_system_message)
    }

    fn has_participant(&self, task_id: Uuid, participant: &NewParticipant) -> bool {
        self.participants.iter().any(|p| {
            p.task_id == task_id
                && p.employee_id == participant.employee_id
                && p.role == participant.role
        })
    }

    fn push_participant(&mut self, task_id: Uuid, participant: NewParticipant) -> TaskParticipant {
        let row = TaskParticipant {
            id: Uuid::new_v4(),
            task_id,
            employee_id: participant.employee_id,
            role: participant.role,
            created_at: Utc::now(),
        };
        self.participants.push(row.clone());
        row
    }

    fn push_message(&mut self, task_id: Uuid, author_id: Option<Uuid>, content: String) -> TaskMessage {
        let now = Utc::now();
        let row = TaskMessage {
            id: Uuid::new_v4(),
            task_id,
            author_id,
            content,
            is_system_message: author_id.is_none(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.messages.push(row.clone());
        row
    }
}

fn newest_first(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tasks
}

/// Storage gateway backed by in-process collections
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, including revoked and expired ones
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    /// Number of stored messages for a task, including soft-deleted ones
    pub async fn message_count(&self, task_id: Uuid) -> usize {
        self.state
            .lock()
            .await
            .messages
            .iter()
            .filter(|m| m.task_id == task_id)
            .count()
    }

    /// Number of task rows, including soft-deleted ones
    pub async fn task_count(&self) -> usize {
        self.state.lock().await.tasks.len()
    }

    /// Number of participant rows across all tasks
    pub async fn participant_count(&self) -> usize {
        self.state.lock().await.participants.len()
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let mut state = self.state.lock().await;
        if state.email_taken(&new.email, None) {
            return Err(StoreError::UniqueViolation {
                constraint: EMPLOYEE_EMAIL_CONSTRAINT.to_string(),
            });
        }

        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4(),
            name: new.name,
            department: new.department,
            position: new.position,
            email: new.email,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.employees.push(employee.clone());
        Ok(employee)
    }

    async fn find_employee(&self, id: Uuid) -> StoreResult<Option<Employee>> {
        Ok(self.state.lock().await.live_employee(id).cloned())
    }

    async fn find_employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let state = self.state.lock().await;
        Ok(state
            .employees
            .iter()
            .find(|e| e.email == email && e.deleted_at.is_none())
            .cloned())
    }

    async fn list_employees(&self, department: Option<&str>) -> StoreResult<Vec<Employee>> {
        let state = self.state.lock().await;
        let mut employees: Vec<Employee> = state
            .employees
            .iter()
            .filter(|e| e.deleted_at.is_none())
            .filter(|e| department.map_or(true, |d| e.department == d))
            .cloned()
            .collect();
        employees.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(employees)
    }

    async fn update_employee(
        &self,
        id: Uuid,
        changes: EmployeeChanges,
    ) -> StoreResult<Option<Employee>> {
        let mut state = self.state.lock().await;
        if let Some(email) = &changes.email {
            if state.email_taken(email, Some(id)) {
                return Err(StoreError::UniqueViolation {
                    constraint: EMPLOYEE_EMAIL_CONSTRAINT.to_string(),
                });
            }
        }

        let Some(employee) = state.live_employee_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            employee.name = name;
        }
        if let Some(department) = changes.department {
            employee.department = department;
        }
        if let Some(position) = changes.position {
            employee.position = position;
        }
        if let Some(email) = changes.email {
            employee.email = email;
        }
        employee.updated_at = Utc::now();
        Ok(Some(employee.clone()))
    }

    async fn soft_delete_employee(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.live_employee_mut(id) {
            Some(employee) => {
                employee.deleted_at = Some(Utc::now());
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert_session(&self, new: NewRefreshSession) -> StoreResult<RefreshSession> {
        let mut state = self.state.lock().await;
        if state.sessions.iter().any(|s| s.token_digest == new.token_digest) {
            return Err(StoreError::UniqueViolation {
                constraint: SESSION_DIGEST_CONSTRAINT.to_string(),
            });
        }

        let session = RefreshSession {
            id: Uuid::new_v4(),
            employee_id: new.employee_id,
            token_digest: new.token_digest,
            expires_at: new.expires_at,
            created_at: Utc::now(),
            revoked_at: None,
            user_agent: new.user_agent,
            ip_address: new.ip_address,
        };
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session_by_digest(&self, digest: &str) -> StoreResult<Option<RefreshSession>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .iter()
            .find(|s| s.token_digest == digest)
            .cloned())
    }

    async fn revoke_session(&self, digest: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(
            match state
                .sessions
                .iter_mut()
                .find(|s| s.token_digest == digest && s.revoked_at.is_none())
            {
                Some(session) => {
                    session.revoked_at = Some(at);
                    true
                }
                None => false,
            },
        )
    }

    async fn consume_session(
        &self,
        digest: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<RefreshSession>> {
        let mut state = self.state.lock().await;
        Ok(state
            .sessions
            .iter_mut()
            .find(|s| s.token_digest == digest && s.is_valid_at(at))
            .map(|session| {
                session.revoked_at = Some(at);
                session.clone()
            }))
    }

    async fn revoke_all_sessions(&self, employee_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let mut revoked = 0;
        for session in state
            .sessions
            .iter_mut()
            .filter(|s| s.employee_id == employee_id && s.revoked_at.is_none())
        {
            session.revoked_at = Some(at);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn delete_expired_sessions(
        &self,
        now: DateTime<Utc>,
        revoked_before: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|s| {
            let expired = s.expires_at < now;
            let stale = s.revoked_at.map_or(false, |r| r < revoked_before);
            !(expired || stale)
        });
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn begin(&self) -> StoreResult<TaskTransaction> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(TaskTransaction::new(Box::new(MemoryUnitOfWork {
            guard,
            staged,
            finished: false,
        })))
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.state.lock().await.live_task(id).cloned())
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state
                .tasks
                .iter()
                .filter(|t| t.deleted_at.is_none() && filter.matches(t))
                .cloned()
                .collect(),
        ))
    }

    async fn list_tasks_for_employee(&self, employee_id: Uuid) -> StoreResult<Vec<Task>> {
        let state = self.state.lock().await;
        let task_ids: HashSet<Uuid> = state
            .participants
            .iter()
            .filter(|p| p.employee_id == employee_id)
            .map(|p| p.task_id)
            .collect();
        Ok(newest_first(
            state
                .tasks
                .iter()
                .filter(|t| t.deleted_at.is_none() && task_ids.contains(&t.id))
                .cloned()
                .collect(),
        ))
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        let mut state = self.state.lock().await;
        let Some(task) = state.live_task_mut(id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn set_archived(&self, id: Uuid, archived: bool) -> StoreResult<Option<Task>> {
        let mut state = self.state.lock().await;
        Ok(state.live_task_mut(id).map(|task| {
            task.archived = archived;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn soft_delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.live_task_mut(id) {
            Some(task) => {
                task.deleted_at = Some(Utc::now());
                true
            }
            None => false,
        })
    }

    async fn insert_participant(
        &self,
        task_id: Uuid,
        participant: NewParticipant,
    ) -> StoreResult<TaskParticipant> {
        let mut state = self.state.lock().await;
        if state.has_participant(task_id, &participant) {
            return Err(StoreError::UniqueViolation {
                constraint: PARTICIPANT_CONSTRAINT.to_string(),
            });
        }
        Ok(state.push_participant(task_id, participant))
    }

    async fn remove_participant(
        &self,
        task_id: Uuid,
        employee_id: Uuid,
        role: ParticipantRole,
    ) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.participants.len();
        state.participants.retain(|p| {
            !(p.task_id == task_id && p.employee_id == employee_id && p.role == role)
        });
        Ok(state.participants.len() < before)
    }

    async fn list_participants(&self, task_id: Uuid) -> StoreResult<Vec<TaskParticipant>> {
        let state = self.state.lock().await;
        Ok(state
            .participants
            .iter()
            .filter(|p| p.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn insert_message(
        &self,
        task_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> StoreResult<TaskMessage> {
        let mut state = self.state.lock().await;
        Ok(state.push_message(task_id, Some(author_id), content))
    }

    async fn find_message(&self, id: Uuid) -> StoreResult<Option<TaskMessage>> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .find(|m| m.id == id && m.deleted_at.is_none())
            .cloned())
    }

    async fn update_message_content(
        &self,
        id: Uuid,
        content: String,
    ) -> StoreResult<Option<TaskMessage>> {
        let mut state = self.state.lock().await;
        Ok(state.user_message_mut(id).map(|message| {
            message.content = content;
            message.updated_at = Utc::now();
            message.clone()
        }))
    }

    async fn soft_delete_message(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.user_message_mut(id) {
            Some(message) => {
                message.deleted_at = Some(Utc::now());
                true
            }
            None => false,
        })
    }

    async fn list_messages(&self, task_id: Uuid) -> StoreResult<Vec<TaskMessage>> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.task_id == task_id && m.deleted_at.is_none())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TimeEntryStore for MemoryStore {
    async fn insert_time_entry(&self, new: NewTimeEntry) -> StoreResult<TimeEntry> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            task_id: new.task_id,
            employee_id: new.employee_id,
            hours: new.hours,
            description: new.description,
            entry_date: new.entry_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.time_entries.push(entry.clone());
        Ok(entry)
    }

    async fn find_time_entry(&self, id: Uuid) -> StoreResult<Option<TimeEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .time_entries
            .iter()
            .find(|e| e.id == id && e.deleted_at.is_none())
            .cloned())
    }

    async fn update_time_entry(
        &self,
        id: Uuid,
        changes: TimeEntryChanges,
    ) -> StoreResult<Option<TimeEntry>> {
        let mut state = self.state.lock().await;
        let Some(entry) = state
            .time_entries
            .iter_mut()
            .find(|e| e.id == id && e.deleted_at.is_none())
        else {
            return Ok(None);
        };
        if let Some(hours) = changes.hours {
            entry.hours = hours;
        }
        if let Some(description) = changes.description {
            entry.description = Some(description);
        }
        if let Some(entry_date) = changes.entry_date {
            entry.entry_date = entry_date;
        }
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn list_time_entries(&self, task_id: Uuid) -> StoreResult<Vec<TimeEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<TimeEntry> = state
            .time_entries
            .iter()
            .filter(|e| e.task_id == task_id && e.deleted_at.is_none())
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        Ok(entries)
    }

    async fn list_time_entries_for_employee(
        &self,
        employee_id: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<TimeEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<TimeEntry> = state
            .time_entries
            .iter()
            .filter(|e| {
                e.employee_id == employee_id && e.deleted_at.is_none() && range.contains(e.entry_date)
            })
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        Ok(entries)
    }

    async fn time_summary(&self, task_id: Uuid) -> StoreResult<TimeSummary> {
        let state = self.state.lock().await;
        let mut summary = TimeSummary::empty(task_id);
        let mut employees = HashSet::new();
        for entry in state
            .time_entries
            .iter()
            .filter(|e| e.task_id == task_id && e.deleted_at.is_none())
        {
            summary.total_hours += entry.hours;
            summary.entry_count += 1;
            employees.insert(entry.employee_id);
        }
        summary.unique_employees = employees.len() as i64;
        Ok(summary)
    }

    async fn soft_delete_time_entry(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(
            match state
                .time_entries
                .iter_mut()
                .find(|e| e.id == id && e.deleted_at.is_none())
            {
                Some(entry) => {
                    entry.deleted_at = Some(Utc::now());
                    true
                }
                None => false,
            },
        )
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    finished: bool,
}

impl MemoryUnitOfWork {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.finished {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "unit of work already committed"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskUnitOfWork for MemoryUnitOfWork {
    async fn employee_exists(&mut self, id: Uuid) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self.staged.live_employee(id).is_some())
    }

    async fn insert_task(&mut self, new: NewTask) -> StoreResult<Task> {
        self.ensure_open()?;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            status: TaskStatus::New,
            priority: new.priority,
            created_by: new.created_by,
            archived: false,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.staged.tasks.push(task.clone());
        Ok(task)
    }

    async fn insert_participant_if_absent(
        &mut self,
        task_id: Uuid,
        participant: NewParticipant,
    ) -> StoreResult<bool> {
        self.ensure_open()?;
        if self.staged.has_participant(task_id, &participant) {
            return Ok(false);
        }
        self.staged.push_participant(task_id, participant);
        Ok(true)
    }

    async fn lock_task_status(&mut self, task_id: Uuid) -> StoreResult<Option<TaskStatus>> {
        self.ensure_open()?;
        Ok(self.staged.live_task(task_id).map(|t| t.status))
    }

    async fn set_task_status(&mut self, task_id: Uuid, status: TaskStatus) -> StoreResult<Task> {
        self.ensure_open()?;
        let task = self.staged.live_task_mut(task_id).ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!("task {} vanished inside unit of work", task_id))
        })?;
        task.status = status;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn append_system_message(
        &mut self,
        task_id: Uuid,
        content: String,
    ) -> StoreResult<TaskMessage> {
        self.ensure_open()?;
        Ok(self.staged.push_message(task_id, None, content))
    }

    async fn commit(&mut self) -> StoreResult<()> {
        self.ensure_open()?;
        *self.guard = std::mem::take(&mut self.staged);
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_employee(email: &str) -> NewEmployee {
        NewEmployee {
            name: "Test".to_string(),
            department: "QA".to_string(),
            position: "Tester".to_string(),
            email: email.to_string(),
            password_hash: None,
        }
    }

    fn new_session(employee_id: Uuid, digest: &str, expires_in: Duration) -> NewRefreshSession {
        NewRefreshSession {
            employee_id,
            token_digest: digest.to_string(),
            expires_at: Utc::now() + expires_in,
            user_agent: None,
            ip_address: None,
        }
    }

    #[tokio::test]
    async fn test_email_unique_among_live_employees() {
        let store = MemoryStore::new();
        let first = store.insert_employee(new_employee("a@x.com")).await.unwrap();

        let duplicate = store.insert_employee(new_employee("a@x.com")).await;
        assert!(matches!(duplicate, Err(StoreError::UniqueViolation { .. })));

        assert!(store.soft_delete_employee(first.id).await.unwrap());
        assert!(store.insert_employee(new_employee("a@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_soft_deleted_employee_is_invisible() {
        let store = MemoryStore::new();
        let employee = store.insert_employee(new_employee("b@x.com")).await.unwrap();
        store.soft_delete_employee(employee.id).await.unwrap();

        assert!(store.find_employee(employee.id).await.unwrap().is_none());
        assert!(store.find_employee_by_email("b@x.com").await.unwrap().is_none());
        assert!(store.list_employees(None).await.unwrap().is_empty());
        assert!(!store.soft_delete_employee(employee.id).await.unwrap());
        assert!(store
            .update_employee(employee.id, EmployeeChanges::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_consume_session_only_once() {
        let store = MemoryStore::new();
        let employee_id = Uuid::new_v4();
        store
            .insert_session(new_session(employee_id, "digest-1", Duration::days(1)))
            .await
            .unwrap();

        let now = Utc::now();
        assert!(store.consume_session("digest-1", now).await.unwrap().is_some());
        assert!(store.consume_session("digest-1", now).await.unwrap().is_none());
        assert!(!store.revoke_session("digest-1", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_consume_rejects_expired_session() {
        let store = MemoryStore::new();
        store
            .insert_session(new_session(Uuid::new_v4(), "old", Duration::seconds(-5)))
            .await
            .unwrap();
        assert!(store.consume_session("old", Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let store = MemoryStore::new();
        let employee_id = Uuid::new_v4();
        let now = Utc::now();

        store
            .insert_session(new_session(employee_id, "expired", Duration::hours(-1)))
            .await
            .unwrap();
        store
            .insert_session(new_session(employee_id, "revoked-long-ago", Duration::days(1)))
            .await
            .unwrap();
        store
            .insert_session(new_session(employee_id, "revoked-recently", Duration::days(1)))
            .await
            .unwrap();
        store
            .insert_session(new_session(employee_id, "live", Duration::days(1)))
            .await
            .unwrap();
        store
            .revoke_session("revoked-long-ago", now - Duration::days(40))
            .await
            .unwrap();
        store.revoke_session("revoked-recently", now).await.unwrap();

        let deleted = store
            .delete_expired_sessions(now, now - Duration::days(30))
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert!(store.find_session_by_digest("live").await.unwrap().is_some());
        assert!(store
            .find_session_by_digest("revoked-recently")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_unit_of_work_rolls_back_on_drop() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let task = tx
            .insert_task(NewTask {
                title: "Rolled back".to_string(),
                description: String::new(),
                priority: 1,
                due_date: None,
                created_by: Uuid::new_v4(),
            })
            .await
            .unwrap();
        tx.append_system_message(task.id, "Task created").await.unwrap();
        drop(tx);

        assert_eq!(store.task_count().await, 0);
        assert_eq!(store.message_count(task.id).await, 0);
    }

    #[tokio::test]
    async fn test_unit_of_work_commit_publishes_writes() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let task = tx
            .insert_task(NewTask {
                title: "Committed".to_string(),
                description: String::new(),
                priority: 1,
                due_date: None,
                created_by: Uuid::new_v4(),
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let found = store.find_task(task.id).await.unwrap().expect("task");
        assert_eq!(found.status, TaskStatus::New);
    }

    #[tokio::test]
    async fn test_system_messages_are_immutable() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let message = tx
            .append_system_message(Uuid::new_v4(), "Task created")
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(store
            .update_message_content(message.id, "edited".to_string())
            .await
            .unwrap()
            .is_none());
        assert!(!store.soft_delete_message(message.id).await.unwrap());
    }
}
