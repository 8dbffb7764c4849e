//! Boundary of the authoritative request/response message store.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{conversation::Conversation, ids::UserId, message::Message};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageStoreError {
    #[error("message store rejected the session credentials")]
    Unauthorized,
    #[error("requested resource does not exist")]
    NotFound,
    #[error("message store rejected the request: {0}")]
    Rejected(String),
    #[error("message store is unavailable: {0}")]
    Unavailable(String),
    #[error("message store returned invalid data: {0}")]
    InvalidData(String),
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn get_conversations(&self) -> Result<Vec<Conversation>, MessageStoreError>;

    async fn get_messages(&self, other_user_id: &UserId) -> Result<Vec<Message>, MessageStoreError>;

    async fn send_message(
        &self,
        receiver_id: &UserId,
        content: &str,
    ) -> Result<Message, MessageStoreError>;

    /// Server-side read receipt for everything `other_user_id` sent.
    async fn mark_read(&self, other_user_id: &UserId) -> Result<(), MessageStoreError>;
}
