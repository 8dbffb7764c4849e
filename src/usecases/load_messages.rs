use crate::domain::{ids::UserId, message::Message};

use super::message_store::{MessageStore, MessageStoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMessagesQuery {
    pub other_user_id: UserId,
}

impl LoadMessagesQuery {
    pub fn new(other_user_id: UserId) -> Self {
        Self { other_user_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMessagesError {
    Unauthorized,
    TemporarilyUnavailable,
    DataContractViolation,
    ConversationNotFound,
}

pub async fn load_messages(
    store: &dyn MessageStore,
    query: LoadMessagesQuery,
) -> Result<Vec<Message>, LoadMessagesError> {
    store
        .get_messages(&query.other_user_id)
        .await
        .map_err(map_source_error)
}

fn map_source_error(error: MessageStoreError) -> LoadMessagesError {
    match error {
        MessageStoreError::Unauthorized => LoadMessagesError::Unauthorized,
        MessageStoreError::NotFound => LoadMessagesError::ConversationNotFound,
        MessageStoreError::InvalidData(_) => LoadMessagesError::DataContractViolation,
        MessageStoreError::Rejected(_) | MessageStoreError::Unavailable(_) => {
            LoadMessagesError::TemporarilyUnavailable
        }
    }
}
