//! Use case for the authoritative create call of a message.

use crate::domain::{ids::UserId, message::Message};

use super::message_store::{MessageStore, MessageStoreError};

/// Command to send a message to a specific counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageCommand {
    pub receiver_id: UserId,
    pub content: String,
}

/// Domain-level errors for send message operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// Message text is empty after trimming whitespace.
    EmptyMessage,
    /// The session is no longer authorized.
    Unauthorized,
    /// The receiver does not exist.
    RecipientNotFound,
    /// The store refused the message (validation, blocked user, ...).
    Rejected,
    /// Service is temporarily unavailable.
    TemporarilyUnavailable,
    /// The store accepted the message but answered with something unreadable.
    DataContractViolation,
}

/// Validates the message text (must not be empty after trimming) and issues
/// the create call.
pub async fn send_message(
    store: &dyn MessageStore,
    command: SendMessageCommand,
) -> Result<Message, SendMessageError> {
    let content = command.content.trim();
    if content.is_empty() {
        return Err(SendMessageError::EmptyMessage);
    }

    store
        .send_message(&command.receiver_id, content)
        .await
        .map_err(map_source_error)
}

fn map_source_error(error: MessageStoreError) -> SendMessageError {
    match error {
        MessageStoreError::Unauthorized => SendMessageError::Unauthorized,
        MessageStoreError::NotFound => SendMessageError::RecipientNotFound,
        MessageStoreError::Rejected(_) => SendMessageError::Rejected,
        MessageStoreError::Unavailable(_) => SendMessageError::TemporarilyUnavailable,
        MessageStoreError::InvalidData(_) => SendMessageError::DataContractViolation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_message, StubStore};

    fn command(text: &str) -> SendMessageCommand {
        SendMessageCommand {
            receiver_id: UserId::new("u2"),
            content: text.to_owned(),
        }
    }

    #[tokio::test]
    async fn rejects_whitespace_only_message() {
        let store = StubStore::default();

        let result = send_message(&store, command("   \n\t  ")).await;

        assert_eq!(result, Err(SendMessageError::EmptyMessage));
        assert!(store.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn trims_whitespace_before_sending() {
        let store = StubStore::default()
            .with_send_result(Ok(sample_message("m1", "u1", "u2", "hello world")));

        let _ = send_message(&store, command("  hello world  ")).await;

        assert_eq!(
            store.sent_messages(),
            vec![(UserId::new("u2"), "hello world".to_owned())]
        );
    }

    #[tokio::test]
    async fn returns_confirmed_message() {
        let confirmed = sample_message("m1", "u1", "u2", "hello");
        let store = StubStore::default().with_send_result(Ok(confirmed.clone()));

        let result = send_message(&store, command("hello")).await;

        assert_eq!(result, Ok(confirmed));
    }

    #[tokio::test]
    async fn maps_rejected_error() {
        let store = StubStore::default()
            .with_send_result(Err(MessageStoreError::Rejected("blocked".into())));

        let result = send_message(&store, command("hello")).await;

        assert_eq!(result, Err(SendMessageError::Rejected));
    }

    #[tokio::test]
    async fn maps_unavailable_error() {
        let store = StubStore::default()
            .with_send_result(Err(MessageStoreError::Unavailable("reset".into())));

        let result = send_message(&store, command("hello")).await;

        assert_eq!(result, Err(SendMessageError::TemporarilyUnavailable));
    }
}
