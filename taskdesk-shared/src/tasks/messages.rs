/// Task message log
///
/// User messages can be posted, edited and deleted. System messages are
/// written only by [`super::TaskService`] and are immutable.

use super::task_not_found;
use crate::error::{AppError, AppResult};
use crate::models::message::TaskMessage;
use crate::store::TaskStore;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn TaskStore>,
}

impl MessageService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Appends a user message authored by `author_id`
    pub async fn post(&self, task_id: Uuid, author_id: Uuid, content: String) -> AppResult<TaskMessage> {
        self.ensure_task(task_id).await?;
        let message = self.store.insert_message(task_id, author_id, content).await?;
        tracing::debug!(task_id = %task_id, message_id = %message.id, "Message posted");
        Ok(message)
    }

    /// # Errors
    ///
    /// - `NotFound` if the message is absent or deleted
    /// - `BadRequest` if it is a system message
    pub async fn edit(&self, message_id: Uuid, content: String) -> AppResult<TaskMessage> {
        self.user_message(message_id, "edited").await?;
        self.store
            .update_message_content(message_id, content)
            .await?
            .ok_or_else(|| message_not_found(message_id))
    }

    pub async fn delete(&self, message_id: Uuid) -> AppResult<()> {
        self.user_message(message_id, "deleted").await?;
        if !self.store.soft_delete_message(message_id).await? {
            return Err(message_not_found(message_id));
        }
        Ok(())
    }

    /// Messages of a task, oldest first
    pub async fn list(&self, task_id: Uuid) -> AppResult<Vec<TaskMessage>> {
        self.ensure_task(task_id).await?;
        Ok(self.store.list_messages(task_id).await?)
    }

    async fn ensure_task(&self, task_id: Uuid) -> AppResult<()> {
        match self.store.find_task(task_id).await? {
            Some(_) => Ok(()),
            None => Err(task_not_found(task_id)),
        }
    }

    async fn user_message(&self, message_id: Uuid, action: &str) -> AppResult<TaskMessage> {
        let message = self
            .store
            .find_message(message_id)
            .await?
            .ok_or_else(|| message_not_found(message_id))?;

        if message.is_system_message {
            return Err(AppError::BadRequest(format!(
                "system messages cannot be {}",
                action
            )));
        }
        Ok(message)
    }
}

fn message_not_found(message_id: Uuid) -> AppError {
    AppError::NotFound(format!("message {} not found", message_id))
}
