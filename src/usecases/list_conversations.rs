use crate::domain::conversation::Conversation;

use super::message_store::{MessageStore, MessageStoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListConversationsError {
    Unauthorized,
    TemporarilyUnavailable,
    DataContractViolation,
}

pub async fn list_conversations(
    store: &dyn MessageStore,
) -> Result<Vec<Conversation>, ListConversationsError> {
    store.get_conversations().await.map_err(map_source_error)
}

fn map_source_error(error: MessageStoreError) -> ListConversationsError {
    match error {
        MessageStoreError::Unauthorized => ListConversationsError::Unauthorized,
        MessageStoreError::InvalidData(_) => ListConversationsError::DataContractViolation,
        MessageStoreError::NotFound
        | MessageStoreError::Rejected(_)
        | MessageStoreError::Unavailable(_) => ListConversationsError::TemporarilyUnavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_conversation, StubStore};

    #[tokio::test]
    async fn keeps_source_payload_without_mutation() {
        let conversations = vec![sample_conversation("c1", "u2", 3)];
        let store = StubStore::default().with_conversations(Ok(conversations.clone()));

        let output = list_conversations(&store).await.expect("list should succeed");

        assert_eq!(output, conversations);
    }

    #[tokio::test]
    async fn maps_unauthorized_error() {
        let store =
            StubStore::default().with_conversations(Err(MessageStoreError::Unauthorized));

        let err = list_conversations(&store).await.expect_err("must fail");

        assert_eq!(err, ListConversationsError::Unauthorized);
    }

    #[tokio::test]
    async fn maps_unavailable_error_to_temporarily_unavailable() {
        let store = StubStore::default()
            .with_conversations(Err(MessageStoreError::Unavailable("timeout".into())));

        let err = list_conversations(&store).await.expect_err("must fail");

        assert_eq!(err, ListConversationsError::TemporarilyUnavailable);
    }

    #[tokio::test]
    async fn maps_invalid_data_error_to_contract_violation() {
        let store = StubStore::default()
            .with_conversations(Err(MessageStoreError::InvalidData("bad json".into())));

        let err = list_conversations(&store).await.expect_err("must fail");

        assert_eq!(err, ListConversationsError::DataContractViolation);
    }
}
