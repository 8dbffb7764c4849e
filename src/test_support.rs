use std::{
    cell::RefCell,
    rc::Rc,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::{
    domain::{
        conversation::{Conversation, Participant},
        events::OutboundEvent,
        ids::{ConversationId, UserId},
        message::{DeliveryStatus, Message, MessageId},
    },
    sync::transport::{ChannelConnector, ChannelHandle, TransportError},
    usecases::{
        message_store::{MessageStore, MessageStoreError},
        store_dispatcher::{StoreDispatcher, StoreRequest},
    },
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().expect("env lock should not be poisoned")
}

pub fn sample_message(id: &str, sender: &str, receiver: &str, content: &str) -> Message {
    Message {
        id: MessageId::Server(id.to_owned()),
        conversation_id: None,
        sender_id: UserId::new(sender),
        receiver_id: UserId::new(receiver),
        content: content.to_owned(),
        created_at_ms: 1_700_000_000_000,
        status: DeliveryStatus::Sent,
    }
}

pub fn sample_conversation(id: &str, counterpart: &str, unread: u32) -> Conversation {
    Conversation {
        id: ConversationId::new(id),
        counterpart: Participant {
            id: UserId::new(counterpart),
            display_name: format!("User {counterpart}"),
        },
        project: None,
        last_message: None,
        unread_count: unread,
        last_activity_ms: 1_700_000_000_000,
    }
}

#[derive(Default)]
struct ConnectorLog {
    outbound: Vec<mpsc::UnboundedReceiver<OutboundEvent>>,
    stops: Vec<watch::Receiver<bool>>,
    sent: Vec<OutboundEvent>,
    fail_next: bool,
}

/// Channel connector that keeps every opened channel in memory.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    log: Rc<RefCell<ConnectorLog>>,
}

impl RecordingConnector {
    /// Everything written to any channel so far, in order.
    pub fn sent(&self) -> Vec<OutboundEvent> {
        let mut log = self.log.borrow_mut();
        let ConnectorLog { outbound, sent, .. } = &mut *log;
        for receiver in outbound.iter_mut() {
            while let Ok(event) = receiver.try_recv() {
                sent.push(event);
            }
        }
        sent.clone()
    }

    pub fn open_count(&self) -> usize {
        self.log.borrow().stops.len()
    }

    pub fn is_stopped(&self, index: usize) -> bool {
        self.log
            .borrow()
            .stops
            .get(index)
            .map(|stop| *stop.borrow())
            .unwrap_or(false)
    }

    pub fn fail_next_open(&self) {
        self.log.borrow_mut().fail_next = true;
    }
}

impl ChannelConnector for RecordingConnector {
    fn open(&self, _session: u64, _user_id: &UserId) -> Result<ChannelHandle, TransportError> {
        let mut log = self.log.borrow_mut();
        if std::mem::take(&mut log.fail_next) {
            return Err(TransportError::InvalidEndpoint("refused by test".into()));
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        log.outbound.push(outbound_rx);
        log.stops.push(stop_rx);
        Ok(ChannelHandle::new(outbound_tx, stop_tx))
    }
}

/// Dispatcher that only records what it was asked to do.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    requests: Rc<RefCell<Vec<StoreRequest>>>,
}

impl RecordingDispatcher {
    pub fn take(&self) -> Vec<StoreRequest> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }
}

impl StoreDispatcher for RecordingDispatcher {
    fn dispatch(&self, request: StoreRequest) {
        self.requests.borrow_mut().push(request);
    }
}

#[derive(Default)]
struct StubCalls {
    threads: Vec<UserId>,
    sent: Vec<(UserId, String)>,
    receipts: Vec<UserId>,
}

/// In-memory message store with canned results.
pub struct StubStore {
    conversations: Result<Vec<Conversation>, MessageStoreError>,
    messages: Result<Vec<Message>, MessageStoreError>,
    send_result: Option<Result<Message, MessageStoreError>>,
    read_result: Result<(), MessageStoreError>,
    calls: Mutex<StubCalls>,
}

impl Default for StubStore {
    fn default() -> Self {
        Self {
            conversations: Ok(Vec::new()),
            messages: Ok(Vec::new()),
            send_result: None,
            read_result: Ok(()),
            calls: Mutex::new(StubCalls::default()),
        }
    }
}

impl StubStore {
    pub fn with_conversations(
        mut self,
        result: Result<Vec<Conversation>, MessageStoreError>,
    ) -> Self {
        self.conversations = result;
        self
    }

    pub fn with_messages(mut self, result: Result<Vec<Message>, MessageStoreError>) -> Self {
        self.messages = result;
        self
    }

    pub fn with_send_result(mut self, result: Result<Message, MessageStoreError>) -> Self {
        self.send_result = Some(result);
        self
    }

    pub fn with_read_result(mut self, result: Result<(), MessageStoreError>) -> Self {
        self.read_result = result;
        self
    }

    pub fn requested_threads(&self) -> Vec<UserId> {
        self.calls().threads.clone()
    }

    pub fn sent_messages(&self) -> Vec<(UserId, String)> {
        self.calls().sent.clone()
    }

    pub fn read_receipts(&self) -> Vec<UserId> {
        self.calls().receipts.clone()
    }

    fn calls(&self) -> MutexGuard<'_, StubCalls> {
        self.calls.lock().expect("stub calls lock")
    }
}

#[async_trait]
impl MessageStore for StubStore {
    async fn get_conversations(&self) -> Result<Vec<Conversation>, MessageStoreError> {
        self.conversations.clone()
    }

    async fn get_messages(&self, other_user_id: &UserId) -> Result<Vec<Message>, MessageStoreError> {
        self.calls().threads.push(other_user_id.clone());
        self.messages.clone()
    }

    async fn send_message(
        &self,
        receiver_id: &UserId,
        content: &str,
    ) -> Result<Message, MessageStoreError> {
        self.calls()
            .sent
            .push((receiver_id.clone(), content.to_owned()));
        match &self.send_result {
            Some(result) => result.clone(),
            None => Ok(sample_message("stub", "u1", receiver_id.as_str(), content)),
        }
    }

    async fn mark_read(&self, other_user_id: &UserId) -> Result<(), MessageStoreError> {
        self.calls().receipts.push(other_user_id.clone());
        self.read_result.clone()
    }
}
