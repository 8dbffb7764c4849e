use crate::domain::ids::UserId;

use super::message_store::{MessageStore, MessageStoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkReadError {
    Unauthorized,
    TemporarilyUnavailable,
}

/// Sends the read receipt that pairs with a local `mark_read`.
pub async fn mark_read(store: &dyn MessageStore, other_user_id: &UserId) -> Result<(), MarkReadError> {
    store
        .mark_read(other_user_id)
        .await
        .map_err(|error| match error {
            MessageStoreError::Unauthorized => MarkReadError::Unauthorized,
            _ => MarkReadError::TemporarilyUnavailable,
        })
}
