use std::sync::Arc;

use chrono::Utc;
use domains::{DomainError, Message, MessageRepo, Result, UserRepo};
use uuid::Uuid;

/// Persisted direct messages. Live delivery is left to an external transport;
/// clients fetch the history from here.
#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageRepo>,
    users: Arc<dyn UserRepo>,
}

impl MessageService {
    pub fn new(messages: Arc<dyn MessageRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self { messages, users }
    }

    pub async fn send(&self, sender_id: Uuid, receiver_id: Uuid, content: String) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(DomainError::ValidationError("message cannot be empty".to_string()));
        }
        if sender_id == receiver_id {
            return Err(DomainError::ValidationError(
                "cannot send a message to yourself".to_string(),
            ));
        }
        if self.users.get_user(receiver_id).await?.is_none() {
            return Err(DomainError::not_found("User", receiver_id));
        }

        let message = Message {
            id: Uuid::now_v7(),
            sender_id,
            receiver_id,
            content,
            created_at: Utc::now(),
        };
        self.messages.insert_message(message.clone()).await?;
        Ok(message)
    }

    pub async fn conversation(&self, user_id: Uuid, peer_id: Uuid) -> Result<Vec<Message>> {
        self.messages.conversation(user_id, peer_id).await
    }
}
