use super::{
    conversation::Conversation,
    ids::{ConversationId, UserId},
    message::{DeliveryEvent, DeliveryStatus, LocalMessageId, Message, MessageId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadUiState {
    Empty,
    Loading,
    Ready,
    Error,
}

/// Scroll margin - number of items to keep visible above/below cursor before scrolling.
const SCROLL_MARGIN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenThread {
    counterpart: UserId,
    title: String,
    conversation_id: Option<ConversationId>,
}

/// Tag attached to a history load. Only the ticket of the latest `open` is
/// accepted when the response comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub counterpart: UserId,
}

/// An optimistic entry that still has to go through the Message Store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub local_id: LocalMessageId,
    pub receiver_id: UserId,
    pub content: String,
    pub message: Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    NoOpenConversation,
    EmptyMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    Applied,
    Stale,
}

/// Message sequence of the currently open conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageThreadController {
    local_user: UserId,
    thread: Option<OpenThread>,
    messages: Vec<Message>,
    ui_state: ThreadUiState,
    generation: u64,
    next_local_id: u64,
    selected_index: Option<usize>,
    scroll_offset: usize,
}

impl MessageThreadController {
    pub fn new(local_user: UserId) -> Self {
        Self {
            local_user,
            thread: None,
            messages: Vec::new(),
            ui_state: ThreadUiState::Empty,
            generation: 0,
            next_local_id: 1,
            selected_index: None,
            scroll_offset: 0,
        }
    }

    pub fn counterpart(&self) -> Option<&UserId> {
        self.thread.as_ref().map(|thread| &thread.counterpart)
    }

    pub fn title(&self) -> &str {
        self.thread
            .as_ref()
            .map(|thread| thread.title.as_str())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn ui_state(&self) -> ThreadUiState {
        self.ui_state
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn selected(&self) -> Option<&Message> {
        self.selected_index.and_then(|index| self.messages.get(index))
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Opens `conversation`, dropping whatever thread was shown. Any history
    /// response tagged with an older ticket is ignored from now on.
    pub fn open(&mut self, conversation: &Conversation) -> LoadTicket {
        self.generation = self.generation.wrapping_add(1);
        self.thread = Some(OpenThread {
            counterpart: conversation.counterpart_id().clone(),
            title: conversation.title(),
            conversation_id: Some(conversation.id.clone()),
        });
        self.messages.clear();
        self.ui_state = ThreadUiState::Loading;
        self.selected_index = None;
        self.scroll_offset = 0;

        LoadTicket {
            generation: self.generation,
            counterpart: conversation.counterpart_id().clone(),
        }
    }

    /// Issues a fresh ticket for the thread that is already open.
    pub fn reload(&mut self) -> Option<LoadTicket> {
        let counterpart = self.counterpart()?.clone();
        self.generation = self.generation.wrapping_add(1);
        if self.messages.is_empty() {
            self.ui_state = ThreadUiState::Loading;
        }

        Some(LoadTicket {
            generation: self.generation,
            counterpart,
        })
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation && self.counterpart() == Some(&ticket.counterpart)
    }

    /// Replaces the thread with the store's history. Entries that were sent
    /// from here and are not confirmed yet stay at the tail.
    pub fn apply_history(&mut self, ticket: &LoadTicket, history: Vec<Message>) -> HistoryOutcome {
        if !self.is_current(ticket) {
            tracing::debug!(
                generation = ticket.generation,
                current_generation = self.generation,
                "dropping stale thread history"
            );
            return HistoryOutcome::Stale;
        }

        let unconfirmed = self
            .messages
            .drain(..)
            .filter(|message| matches!(message.id, MessageId::Local(_)));

        let mut messages = history;
        messages.extend(unconfirmed);

        self.selected_index = messages.len().checked_sub(1);
        self.messages = messages;
        self.ui_state = ThreadUiState::Ready;
        HistoryOutcome::Applied
    }

    pub fn history_failed(&mut self, ticket: &LoadTicket) -> HistoryOutcome {
        if !self.is_current(ticket) {
            return HistoryOutcome::Stale;
        }

        if self.messages.is_empty() {
            self.ui_state = ThreadUiState::Error;
        }
        HistoryOutcome::Applied
    }

    /// Appends an optimistic `sending` entry at the tail and returns what the
    /// caller needs for the store call and the live emit.
    pub fn send(&mut self, content: &str, now_ms: i64) -> Result<PendingSend, SendRejected> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SendRejected::EmptyMessage);
        }

        let Some(thread) = self.thread.as_ref() else {
            return Err(SendRejected::NoOpenConversation);
        };

        let local_id = LocalMessageId(self.next_local_id);
        self.next_local_id += 1;

        let message = Message {
            id: MessageId::Local(local_id),
            conversation_id: thread.conversation_id.clone(),
            sender_id: self.local_user.clone(),
            receiver_id: thread.counterpart.clone(),
            content: content.to_owned(),
            created_at_ms: now_ms,
            status: DeliveryStatus::Sending,
        };

        let pending = PendingSend {
            local_id,
            receiver_id: thread.counterpart.clone(),
            content: content.to_owned(),
            message: message.clone(),
        };

        self.push(message);
        Ok(pending)
    }

    /// Replaces the optimistic entry in place with the confirmed one.
    /// Returns false when the entry is no longer in this thread.
    pub fn acknowledge(&mut self, local_id: LocalMessageId, confirmed: Message) -> bool {
        let Some(index) = self.position_of(local_id) else {
            return false;
        };

        let current = self.messages[index].status;
        let Some(status) = current.transition(DeliveryEvent::Acknowledged) else {
            tracing::warn!(
                local_id = local_id.0,
                status = current.as_label(),
                "ignoring acknowledgment for entry in non-pending state"
            );
            return false;
        };

        // A reload that finished before the ack may already hold the
        // persisted copy; keep that one and drop the optimistic entry.
        let already_persisted = self
            .messages
            .iter()
            .any(|message| message.id == confirmed.id);
        if already_persisted {
            self.remove_at(index);
            return true;
        }

        self.messages[index] = Message {
            status,
            ..confirmed
        };
        true
    }

    /// Marks the optimistic entry as failed and hands back its content for the
    /// compose field.
    pub fn fail(&mut self, local_id: LocalMessageId) -> Option<String> {
        let index = self.position_of(local_id)?;
        let message = &mut self.messages[index];
        message.status = message.status.transition(DeliveryEvent::Rejected)?;
        Some(message.content.clone())
    }

    /// Puts a failed entry back into `sending`, keeping its position.
    pub fn retry(&mut self, local_id: LocalMessageId) -> Option<PendingSend> {
        let index = self.position_of(local_id)?;
        let message = &mut self.messages[index];
        message.status = message.status.transition(DeliveryEvent::Retried)?;

        Some(PendingSend {
            local_id,
            receiver_id: message.receiver_id.clone(),
            content: message.content.clone(),
            message: message.clone(),
        })
    }

    /// Removes a failed entry. Entries in any other status are kept.
    pub fn discard(&mut self, local_id: LocalMessageId) -> bool {
        let Some(index) = self.position_of(local_id) else {
            return false;
        };

        if self.messages[index].status != DeliveryStatus::Failed {
            return false;
        }

        self.remove_at(index);
        true
    }

    /// Appends a message pushed over the live channel if it comes from the
    /// open thread's counterpart.
    pub fn apply_live(&mut self, message: Message) -> bool {
        if self.counterpart() != Some(&message.sender_id) {
            return false;
        }

        self.push(Message {
            status: DeliveryStatus::Delivered,
            ..message
        });
        true
    }

    /// Selects the next message (moves down in the list).
    pub fn select_next(&mut self) {
        if self.messages.is_empty() {
            return;
        }

        self.selected_index = match self.selected_index {
            None => Some(0),
            Some(idx) if idx + 1 < self.messages.len() => Some(idx + 1),
            Some(idx) => Some(idx),
        };
    }

    /// Selects the previous message (moves up in the list).
    pub fn select_previous(&mut self) {
        if self.messages.is_empty() {
            return;
        }

        self.selected_index = match self.selected_index {
            None => Some(self.messages.len() - 1),
            Some(idx) => Some(idx.saturating_sub(1)),
        };
    }

    /// Keeps the cursor visible with SCROLL_MARGIN items above/below.
    ///
    /// `element_index` is the visual index in the list (accounting for date separators).
    pub fn update_scroll_offset(&mut self, element_index: usize, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }

        let effective_margin = SCROLL_MARGIN.min(viewport_height / 2);

        if element_index < self.scroll_offset + effective_margin {
            self.scroll_offset = element_index.saturating_sub(effective_margin);
        }

        let visible_bottom = self.scroll_offset + viewport_height;
        if element_index + effective_margin >= visible_bottom {
            self.scroll_offset =
                (element_index + effective_margin + 1).saturating_sub(viewport_height);
        }
    }

    fn push(&mut self, message: Message) {
        let follows_tail = match self.selected_index {
            None => true,
            Some(index) => index + 1 >= self.messages.len(),
        };

        self.messages.push(message);
        if self.ui_state != ThreadUiState::Loading {
            self.ui_state = ThreadUiState::Ready;
        }
        if follows_tail {
            self.selected_index = Some(self.messages.len() - 1);
        }
    }

    fn remove_at(&mut self, index: usize) {
        self.messages.remove(index);
        self.selected_index = match self.selected_index {
            _ if self.messages.is_empty() => None,
            Some(selected) => Some(selected.min(self.messages.len() - 1)),
            None => None,
        };
    }

    fn position_of(&self, local_id: LocalMessageId) -> Option<usize> {
        self.messages
            .iter()
            .position(|message| message.id == MessageId::Local(local_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Participant;

    const ME: &str = "me";

    fn controller() -> MessageThreadController {
        MessageThreadController::new(UserId::new(ME))
    }

    fn conversation(id: &str, counterpart: &str) -> Conversation {
        Conversation {
            id: ConversationId::new(id),
            counterpart: Participant {
                id: UserId::new(counterpart),
                display_name: counterpart.to_owned(),
            },
            project: None,
            last_message: None,
            unread_count: 0,
            last_activity_ms: 0,
        }
    }

    fn server_message(id: &str, sender: &str, receiver: &str, content: &str) -> Message {
        Message {
            id: MessageId::Server(id.to_owned()),
            conversation_id: None,
            sender_id: UserId::new(sender),
            receiver_id: UserId::new(receiver),
            content: content.to_owned(),
            created_at_ms: 1000,
            status: DeliveryStatus::Sent,
        }
    }

    fn confirmed(pending: &PendingSend, id: &str) -> Message {
        server_message(id, ME, pending.receiver_id.as_str(), &pending.content)
    }

    fn opened(counterpart: &str) -> MessageThreadController {
        let mut controller = controller();
        let ticket = controller.open(&conversation("c1", counterpart));
        controller.apply_history(&ticket, vec![]);
        controller
    }

    fn contents(controller: &MessageThreadController) -> Vec<(&str, DeliveryStatus)> {
        controller
            .messages()
            .iter()
            .map(|message| (message.content.as_str(), message.status))
            .collect()
    }

    #[test]
    fn default_state_is_empty() {
        let controller = controller();

        assert_eq!(controller.ui_state(), ThreadUiState::Empty);
        assert!(controller.counterpart().is_none());
        assert!(controller.messages().is_empty());
    }

    #[test]
    fn open_starts_loading_and_history_replaces_thread() {
        let mut controller = controller();

        let ticket = controller.open(&conversation("c1", "alice"));
        assert_eq!(controller.ui_state(), ThreadUiState::Loading);

        let outcome = controller.apply_history(
            &ticket,
            vec![
                server_message("m1", "alice", ME, "hi"),
                server_message("m2", ME, "alice", "hello"),
            ],
        );

        assert_eq!(outcome, HistoryOutcome::Applied);
        assert_eq!(controller.ui_state(), ThreadUiState::Ready);
        assert_eq!(controller.messages().len(), 2);
        assert_eq!(controller.selected_index(), Some(1));
    }

    #[test]
    fn stale_history_does_not_touch_newly_opened_thread() {
        let mut controller = controller();
        let ticket_a = controller.open(&conversation("ca", "alice"));
        let ticket_b = controller.open(&conversation("cb", "bob"));
        controller.apply_history(&ticket_b, vec![server_message("b1", "bob", ME, "from b")]);

        let outcome =
            controller.apply_history(&ticket_a, vec![server_message("a1", "alice", ME, "from a")]);

        assert_eq!(outcome, HistoryOutcome::Stale);
        assert_eq!(controller.counterpart(), Some(&UserId::new("bob")));
        assert_eq!(contents(&controller), vec![("from b", DeliveryStatus::Sent)]);
    }

    #[test]
    fn stale_history_failure_does_not_flag_error() {
        let mut controller = controller();
        let ticket_a = controller.open(&conversation("ca", "alice"));
        let _ticket_b = controller.open(&conversation("cb", "bob"));

        assert_eq!(controller.history_failed(&ticket_a), HistoryOutcome::Stale);
        assert_eq!(controller.ui_state(), ThreadUiState::Loading);
    }

    #[test]
    fn send_success_yields_single_sent_entry() {
        let mut controller = opened("alice");

        let pending = controller.send("hi", 10).expect("send accepted");
        assert_eq!(contents(&controller), vec![("hi", DeliveryStatus::Sending)]);

        assert!(controller.acknowledge(pending.local_id, confirmed(&pending, "srv-1")));

        assert_eq!(contents(&controller), vec![("hi", DeliveryStatus::Sent)]);
        assert_eq!(
            controller.messages()[0].id,
            MessageId::Server("srv-1".to_owned())
        );
    }

    #[test]
    fn send_failure_keeps_failed_entry_and_returns_content() {
        let mut controller = opened("alice");

        let pending = controller.send("hi", 10).expect("send accepted");
        let restored = controller.fail(pending.local_id);

        assert_eq!(restored.as_deref(), Some("hi"));
        assert_eq!(contents(&controller), vec![("hi", DeliveryStatus::Failed)]);
    }

    #[test]
    fn thread_order_follows_send_order_regardless_of_ack_order() {
        let mut controller = opened("alice");
        let first = controller.send("one", 1).expect("first");
        let second = controller.send("two", 2).expect("second");
        let third = controller.send("three", 3).expect("third");

        controller.acknowledge(third.local_id, confirmed(&third, "s3"));
        controller.acknowledge(first.local_id, confirmed(&first, "s1"));
        controller.acknowledge(second.local_id, confirmed(&second, "s2"));

        assert_eq!(
            contents(&controller),
            vec![
                ("one", DeliveryStatus::Sent),
                ("two", DeliveryStatus::Sent),
                ("three", DeliveryStatus::Sent),
            ]
        );
    }

    #[test]
    fn failed_send_stays_at_its_original_position() {
        let mut controller = opened("alice");
        let first = controller.send("one", 1).expect("first");
        let second = controller.send("two", 2).expect("second");
        let third = controller.send("three", 3).expect("third");

        controller.acknowledge(third.local_id, confirmed(&third, "s3"));
        controller.fail(second.local_id);
        controller.acknowledge(first.local_id, confirmed(&first, "s1"));

        assert_eq!(
            contents(&controller),
            vec![
                ("one", DeliveryStatus::Sent),
                ("two", DeliveryStatus::Failed),
                ("three", DeliveryStatus::Sent),
            ]
        );
        let failed = controller
            .messages()
            .iter()
            .filter(|message| message.status == DeliveryStatus::Failed)
            .count();
        assert_eq!(failed, 1);
    }

    #[test]
    fn second_failure_report_does_not_duplicate_entry() {
        let mut controller = opened("alice");
        let pending = controller.send("hi", 1).expect("send");

        controller.fail(pending.local_id);
        controller.fail(pending.local_id);

        assert_eq!(controller.messages().len(), 1);
    }

    #[test]
    fn failed_entry_cannot_be_acknowledged_without_retry() {
        let mut controller = opened("alice");
        let pending = controller.send("hi", 1).expect("send");
        controller.fail(pending.local_id);

        assert!(!controller.acknowledge(pending.local_id, confirmed(&pending, "s1")));
        assert_eq!(contents(&controller), vec![("hi", DeliveryStatus::Failed)]);
    }

    #[test]
    fn retry_resends_in_place() {
        let mut controller = opened("alice");
        let first = controller.send("one", 1).expect("first");
        let second = controller.send("two", 2).expect("second");
        controller.fail(first.local_id);

        let retried = controller.retry(first.local_id).expect("retry allowed");
        assert_eq!(retried.content, "one");
        controller.acknowledge(second.local_id, confirmed(&second, "s2"));
        controller.acknowledge(retried.local_id, confirmed(&retried, "s1"));

        assert_eq!(
            contents(&controller),
            vec![("one", DeliveryStatus::Sent), ("two", DeliveryStatus::Sent)]
        );
    }

    #[test]
    fn retry_is_refused_for_entries_that_are_not_failed() {
        let mut controller = opened("alice");
        let pending = controller.send("hi", 1).expect("send");

        assert!(controller.retry(pending.local_id).is_none());
    }

    #[test]
    fn discard_removes_only_failed_entries() {
        let mut controller = opened("alice");
        let sending = controller.send("one", 1).expect("first");
        let failing = controller.send("two", 2).expect("second");
        controller.fail(failing.local_id);

        assert!(!controller.discard(sending.local_id));
        assert!(controller.discard(failing.local_id));
        assert_eq!(contents(&controller), vec![("one", DeliveryStatus::Sending)]);
        assert_eq!(controller.selected_index(), Some(0));
    }

    #[test]
    fn send_rejects_blank_content() {
        let mut controller = opened("alice");

        assert_eq!(controller.send("   \n", 1), Err(SendRejected::EmptyMessage));
        assert!(controller.messages().is_empty());
    }

    #[test]
    fn send_without_open_conversation_is_rejected() {
        let mut controller = controller();

        assert_eq!(
            controller.send("hi", 1),
            Err(SendRejected::NoOpenConversation)
        );
    }

    #[test]
    fn send_trims_and_addresses_counterpart() {
        let mut controller = opened("alice");

        let pending = controller.send("  hi there ", 1).expect("send");

        assert_eq!(pending.content, "hi there");
        assert_eq!(pending.receiver_id, UserId::new("alice"));
        assert_eq!(pending.message.sender_id, UserId::new(ME));
        assert_eq!(
            pending.message.conversation_id,
            Some(ConversationId::new("c1"))
        );
    }

    #[test]
    fn ack_for_previous_thread_is_ignored() {
        let mut controller = opened("alice");
        let pending = controller.send("hi", 1).expect("send");
        let ticket = controller.open(&conversation("c2", "bob"));
        controller.apply_history(&ticket, vec![]);

        assert!(!controller.acknowledge(pending.local_id, confirmed(&pending, "s1")));
        assert!(controller.messages().is_empty());
    }

    #[test]
    fn live_message_from_counterpart_is_appended_as_delivered() {
        let mut controller = opened("alice");

        let appended = controller.apply_live(server_message("m9", "alice", ME, "ping"));

        assert!(appended);
        assert_eq!(contents(&controller), vec![("ping", DeliveryStatus::Delivered)]);
    }

    #[test]
    fn live_message_from_someone_else_is_ignored() {
        let mut controller = opened("alice");

        assert!(!controller.apply_live(server_message("m9", "bob", ME, "ping")));
        assert!(controller.messages().is_empty());
    }

    #[test]
    fn reload_keeps_unconfirmed_entries_at_the_tail() {
        let mut controller = opened("alice");
        let pending = controller.send("pending", 5).expect("send");

        let ticket = controller.reload().expect("thread is open");
        controller.apply_history(&ticket, vec![server_message("m1", "alice", ME, "old")]);

        assert_eq!(
            contents(&controller),
            vec![
                ("old", DeliveryStatus::Sent),
                ("pending", DeliveryStatus::Sending)
            ]
        );
        assert!(controller.acknowledge(pending.local_id, confirmed(&pending, "s1")));
    }

    #[test]
    fn ack_after_reload_with_persisted_copy_keeps_one_entry() {
        let mut controller = opened("alice");
        let pending = controller.send("hi", 5).expect("send");

        let ticket = controller.reload().expect("thread is open");
        controller.apply_history(&ticket, vec![confirmed(&pending, "s1")]);
        assert_eq!(controller.messages().len(), 2);

        assert!(controller.acknowledge(pending.local_id, confirmed(&pending, "s1")));

        let ids: Vec<String> = controller
            .messages()
            .iter()
            .map(|message| message.id.to_string())
            .collect();
        assert_eq!(ids, vec!["s1".to_owned()]);
        assert_eq!(contents(&controller), vec![("hi", DeliveryStatus::Sent)]);
        assert_eq!(controller.selected_index(), Some(0));
    }

    #[test]
    fn reload_replaces_live_entries_with_persisted_copy() {
        let mut controller = opened("alice");
        controller.apply_live(server_message("m1", "alice", ME, "ping"));

        let ticket = controller.reload().expect("thread is open");
        controller.apply_history(&ticket, vec![server_message("m1", "alice", ME, "ping")]);

        assert_eq!(contents(&controller), vec![("ping", DeliveryStatus::Sent)]);
    }

    #[test]
    fn reload_invalidates_earlier_ticket() {
        let mut controller = controller();
        let first = controller.open(&conversation("c1", "alice"));

        let second = controller.reload().expect("thread is open");

        assert_eq!(
            controller.apply_history(&first, vec![]),
            HistoryOutcome::Stale
        );
        assert_eq!(
            controller.apply_history(&second, vec![]),
            HistoryOutcome::Applied
        );
    }

    #[test]
    fn selection_follows_tail_when_at_last_message() {
        let mut controller = opened("alice");
        controller.apply_live(server_message("m1", "alice", ME, "a"));
        controller.apply_live(server_message("m2", "alice", ME, "b"));

        assert_eq!(controller.selected_index(), Some(1));

        controller.select_previous();
        controller.apply_live(server_message("m3", "alice", ME, "c"));

        assert_eq!(controller.selected_index(), Some(0));
    }

    #[test]
    fn update_scroll_offset_scrolls_down_when_cursor_near_bottom() {
        let mut controller = controller();

        controller.update_scroll_offset(18, 20);

        assert!(controller.scroll_offset() > 0);
    }

    #[test]
    fn update_scroll_offset_handles_zero_viewport() {
        let mut controller = controller();
        controller.scroll_offset = 5;

        controller.update_scroll_offset(10, 0);

        assert_eq!(controller.scroll_offset(), 5);
    }
}
