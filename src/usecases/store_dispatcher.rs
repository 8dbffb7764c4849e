//! Runs Message Store calls off the UI thread and reports their completion
//! back on the application event channel.

use std::sync::{mpsc::Sender, Arc};

use tokio::runtime::Handle;

use crate::domain::{
    conversation::Conversation,
    ids::UserId,
    message::{LocalMessageId, Message},
    message_thread::{LoadTicket, PendingSend},
};

use super::{
    contracts::AppEvent,
    list_conversations::{list_conversations, ListConversationsError},
    load_messages::{load_messages, LoadMessagesError, LoadMessagesQuery},
    mark_read::{mark_read, MarkReadError},
    message_store::MessageStore,
    send_message::{send_message, SendMessageCommand, SendMessageError},
};

const STORE_RESPONSE_DROPPED: &str = "STORE_RESPONSE_DROPPED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRequest {
    LoadConversations,
    LoadMessages(LoadTicket),
    SendMessage(PendingSend),
    MarkRead(UserId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreResponse {
    ConversationsLoaded(Result<Vec<Conversation>, ListConversationsError>),
    MessagesLoaded {
        ticket: LoadTicket,
        result: Result<Vec<Message>, LoadMessagesError>,
    },
    MessageSent {
        local_id: LocalMessageId,
        result: Result<Message, SendMessageError>,
    },
    ReadMarked {
        other_user_id: UserId,
        result: Result<(), MarkReadError>,
    },
}

impl StoreResponse {
    /// True when the store no longer accepts the session credentials.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::ConversationsLoaded(Err(ListConversationsError::Unauthorized))
            | Self::MessagesLoaded {
                result: Err(LoadMessagesError::Unauthorized),
                ..
            }
            | Self::MessageSent {
                result: Err(SendMessageError::Unauthorized),
                ..
            }
            | Self::ReadMarked {
                result: Err(MarkReadError::Unauthorized),
                ..
            } => true,
            _ => false,
        }
    }
}

pub trait StoreDispatcher {
    fn dispatch(&self, request: StoreRequest);
}

pub async fn execute(store: &dyn MessageStore, request: StoreRequest) -> StoreResponse {
    match request {
        StoreRequest::LoadConversations => {
            StoreResponse::ConversationsLoaded(list_conversations(store).await)
        }
        StoreRequest::LoadMessages(ticket) => {
            let query = LoadMessagesQuery::new(ticket.counterpart.clone());
            let result = load_messages(store, query).await;
            StoreResponse::MessagesLoaded { ticket, result }
        }
        StoreRequest::SendMessage(pending) => {
            let command = SendMessageCommand {
                receiver_id: pending.receiver_id,
                content: pending.content,
            };
            let result = send_message(store, command).await;
            StoreResponse::MessageSent {
                local_id: pending.local_id,
                result,
            }
        }
        StoreRequest::MarkRead(other_user_id) => {
            let result = mark_read(store, &other_user_id).await;
            StoreResponse::ReadMarked {
                other_user_id,
                result,
            }
        }
    }
}

/// Spawns every request on the shared runtime. Responses may arrive in any
/// order; the state machines decide what is still relevant.
pub struct TokioStoreDispatcher {
    runtime: Handle,
    store: Arc<dyn MessageStore>,
    events_tx: Sender<AppEvent>,
}

impl TokioStoreDispatcher {
    pub fn new(runtime: Handle, store: Arc<dyn MessageStore>, events_tx: Sender<AppEvent>) -> Self {
        Self {
            runtime,
            store,
            events_tx,
        }
    }
}

impl StoreDispatcher for TokioStoreDispatcher {
    fn dispatch(&self, request: StoreRequest) {
        let store = Arc::clone(&self.store);
        let events_tx = self.events_tx.clone();

        self.runtime.spawn(async move {
            let response = execute(store.as_ref(), request).await;
            if events_tx.send(AppEvent::Store(response)).is_err() {
                tracing::debug!(
                    code = STORE_RESPONSE_DROPPED,
                    "event loop is gone; dropping store response"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, time::Duration};

    use super::*;
    use crate::{
        domain::message::DeliveryStatus,
        test_support::{sample_message, StubStore},
        usecases::message_store::MessageStoreError,
    };

    fn pending(content: &str) -> PendingSend {
        let mut message = sample_message("local", "u1", "u2", content);
        message.id = crate::domain::message::MessageId::Local(LocalMessageId(7));
        message.status = DeliveryStatus::Sending;
        PendingSend {
            local_id: LocalMessageId(7),
            receiver_id: UserId::new("u2"),
            content: content.to_owned(),
            message,
        }
    }

    #[tokio::test]
    async fn load_messages_response_carries_the_ticket() {
        let store = StubStore::default().with_messages(Ok(vec![]));
        let ticket = LoadTicket {
            generation: 4,
            counterpart: UserId::new("u2"),
        };

        let response = execute(&store, StoreRequest::LoadMessages(ticket.clone())).await;

        assert_eq!(
            response,
            StoreResponse::MessagesLoaded {
                ticket,
                result: Ok(vec![])
            }
        );
    }

    #[tokio::test]
    async fn send_response_carries_the_local_id() {
        let confirmed = sample_message("m1", "u1", "u2", "hi");
        let store = StubStore::default().with_send_result(Ok(confirmed.clone()));

        let response = execute(&store, StoreRequest::SendMessage(pending("hi"))).await;

        assert_eq!(
            response,
            StoreResponse::MessageSent {
                local_id: LocalMessageId(7),
                result: Ok(confirmed)
            }
        );
    }

    #[tokio::test]
    async fn unauthorized_responses_are_flagged() {
        let store = StubStore::default().with_read_result(Err(MessageStoreError::Unauthorized));

        let response = execute(&store, StoreRequest::MarkRead(UserId::new("u2"))).await;

        assert!(response.is_unauthorized());
    }

    #[test]
    fn dispatcher_reports_completion_on_event_channel() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let (events_tx, events_rx) = mpsc::channel();
        let store: Arc<dyn MessageStore> = Arc::new(StubStore::default());
        let dispatcher = TokioStoreDispatcher::new(runtime.handle().clone(), store, events_tx);

        dispatcher.dispatch(StoreRequest::LoadConversations);
        runtime.block_on(async { tokio::time::sleep(Duration::from_millis(10)).await });

        let event = events_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("store response");
        assert_eq!(
            event,
            AppEvent::Store(StoreResponse::ConversationsLoaded(Ok(vec![])))
        );
    }
}
