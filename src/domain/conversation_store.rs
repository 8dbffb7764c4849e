use super::{
    conversation::{Conversation, LastMessageSummary},
    ids::{ConversationId, UserId},
    message::Message,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationListUiState {
    Loading,
    Ready,
    Empty,
    Error,
}

/// What the caller must do after an incoming message was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingOutcome {
    /// An existing conversation was updated in place.
    Updated,
    /// No conversation exists for the counterpart yet; the list has to be
    /// fetched again to pick it up.
    ReloadRequired,
}

/// The current user's conversations, newest activity first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationStore {
    local_user: UserId,
    ui_state: ConversationListUiState,
    conversations: Vec<Conversation>,
    selected_index: Option<usize>,
}

impl ConversationStore {
    pub fn new(local_user: UserId) -> Self {
        Self {
            local_user,
            ui_state: ConversationListUiState::Loading,
            conversations: Vec::new(),
            selected_index: None,
        }
    }

    pub fn ui_state(&self) -> ConversationListUiState {
        self.ui_state
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn selected(&self) -> Option<&Conversation> {
        self.selected_index
            .and_then(|index| self.conversations.get(index))
    }

    pub fn find_by_counterpart(&self, counterpart: &UserId) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|conversation| conversation.counterpart_id() == counterpart)
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations
            .iter()
            .map(|conversation| conversation.unread_count)
            .sum()
    }

    /// Marks the start of a `load()`. A list that is already shown stays
    /// visible until the response arrives.
    pub fn begin_load(&mut self) {
        if self.conversations.is_empty() {
            self.ui_state = ConversationListUiState::Loading;
        }
    }

    /// Completes a `load()` by replacing the whole list with the store's copy.
    pub fn replace_all(&mut self, conversations: Vec<Conversation>) {
        let previous = self
            .selected()
            .map(|conversation| conversation.counterpart_id().clone());

        self.conversations = dedupe_by_counterpart(conversations);
        self.sort();

        if self.conversations.is_empty() {
            self.ui_state = ConversationListUiState::Empty;
            self.selected_index = None;
            return;
        }

        self.ui_state = ConversationListUiState::Ready;
        self.selected_index = resolve_selection_index(&self.conversations, previous.as_ref());
    }

    /// A failed `load()` keeps whatever was shown before.
    pub fn load_failed(&mut self) {
        if self.conversations.is_empty() {
            self.ui_state = ConversationListUiState::Error;
            self.selected_index = None;
        }
    }

    pub fn apply_incoming_message(
        &mut self,
        message: &Message,
        open_counterpart: Option<&UserId>,
    ) -> IncomingOutcome {
        let counterpart = message.counterpart_of(&self.local_user).clone();
        let previous = self
            .selected()
            .map(|conversation| conversation.counterpart_id().clone());

        let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|conversation| conversation.counterpart_id() == &counterpart)
        else {
            return IncomingOutcome::ReloadRequired;
        };

        conversation.last_message = Some(LastMessageSummary::from(message));
        conversation.last_activity_ms = conversation.last_activity_ms.max(message.created_at_ms);

        let is_open = open_counterpart == Some(&counterpart);
        if !message.is_authored_by(&self.local_user) && !is_open {
            conversation.unread_count = conversation.unread_count.saturating_add(1);
        }

        self.sort();
        self.selected_index = resolve_selection_index(&self.conversations, previous.as_ref());
        IncomingOutcome::Updated
    }

    /// Zeroes the unread counter. Returns the counterpart so the caller can
    /// send the matching read receipt to the Message Store.
    pub fn mark_read(&mut self, conversation_id: &ConversationId) -> Option<UserId> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|conversation| &conversation.id == conversation_id)?;

        conversation.unread_count = 0;
        Some(conversation.counterpart_id().clone())
    }

    pub fn select_next(&mut self) {
        let Some(index) = self.selected_index else {
            return;
        };

        let last_index = self.conversations.len().saturating_sub(1);
        self.selected_index = Some(std::cmp::min(index.saturating_add(1), last_index));
    }

    pub fn select_previous(&mut self) {
        let Some(index) = self.selected_index else {
            return;
        };

        self.selected_index = Some(index.saturating_sub(1));
    }

    fn sort(&mut self) {
        self.conversations
            .sort_by(|left, right| right.last_activity_ms.cmp(&left.last_activity_ms));
    }
}

fn dedupe_by_counterpart(conversations: Vec<Conversation>) -> Vec<Conversation> {
    let mut unique: Vec<Conversation> = Vec::with_capacity(conversations.len());

    for conversation in conversations {
        match unique
            .iter_mut()
            .find(|known| known.counterpart_id() == conversation.counterpart_id())
        {
            Some(known) if known.last_activity_ms < conversation.last_activity_ms => {
                *known = conversation;
            }
            Some(_) => {}
            None => unique.push(conversation),
        }
    }

    unique
}

fn resolve_selection_index(
    conversations: &[Conversation],
    previous_counterpart: Option<&UserId>,
) -> Option<usize> {
    if conversations.is_empty() {
        return None;
    }

    previous_counterpart
        .and_then(|counterpart| {
            conversations
                .iter()
                .position(|conversation| conversation.counterpart_id() == counterpart)
        })
        .or(Some(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        conversation::Participant,
        message::{DeliveryStatus, MessageId},
    };

    const ME: &str = "me";

    fn store() -> ConversationStore {
        ConversationStore::new(UserId::new(ME))
    }

    fn conversation(id: &str, counterpart: &str, unread: u32, activity: i64) -> Conversation {
        Conversation {
            id: ConversationId::new(id),
            counterpart: Participant {
                id: UserId::new(counterpart),
                display_name: counterpart.to_uppercase(),
            },
            project: None,
            last_message: None,
            unread_count: unread,
            last_activity_ms: activity,
        }
    }

    fn message(sender: &str, receiver: &str, at: i64) -> Message {
        Message {
            id: MessageId::Server(format!("{sender}-{at}")),
            conversation_id: None,
            sender_id: UserId::new(sender),
            receiver_id: UserId::new(receiver),
            content: format!("from {sender}"),
            created_at_ms: at,
            status: DeliveryStatus::Sent,
        }
    }

    fn order(store: &ConversationStore) -> Vec<&str> {
        store
            .conversations()
            .iter()
            .map(|conversation| conversation.id.as_str())
            .collect()
    }

    #[test]
    fn default_state_is_loading_without_selection() {
        let store = store();

        assert_eq!(store.ui_state(), ConversationListUiState::Loading);
        assert!(store.conversations().is_empty());
        assert_eq!(store.selected_index(), None);
    }

    #[test]
    fn replace_all_sorts_by_last_activity_descending() {
        let mut store = store();

        store.replace_all(vec![
            conversation("c1", "alice", 0, 100),
            conversation("c2", "bob", 0, 300),
            conversation("c3", "carol", 0, 200),
        ]);

        assert_eq!(store.ui_state(), ConversationListUiState::Ready);
        assert_eq!(order(&store), vec!["c2", "c3", "c1"]);
        assert_eq!(store.selected_index(), Some(0));
    }

    #[test]
    fn replace_all_keeps_one_conversation_per_counterpart() {
        let mut store = store();

        store.replace_all(vec![
            conversation("old", "alice", 1, 100),
            conversation("new", "alice", 4, 500),
        ]);

        assert_eq!(order(&store), vec!["new"]);
        assert_eq!(store.conversations()[0].unread_count, 4);
    }

    #[test]
    fn replace_all_is_a_full_replace_not_a_merge() {
        let mut store = store();
        store.replace_all(vec![conversation("c1", "alice", 3, 100)]);

        store.replace_all(vec![conversation("c2", "bob", 0, 50)]);

        assert_eq!(order(&store), vec!["c2"]);
    }

    #[test]
    fn replace_all_with_empty_list_transitions_to_empty() {
        let mut store = store();

        store.replace_all(vec![]);

        assert_eq!(store.ui_state(), ConversationListUiState::Empty);
        assert_eq!(store.selected_index(), None);
    }

    #[test]
    fn failed_reload_keeps_stale_list() {
        let mut store = store();
        store.replace_all(vec![conversation("c1", "alice", 0, 100)]);

        store.begin_load();
        store.load_failed();

        assert_eq!(store.ui_state(), ConversationListUiState::Ready);
        assert_eq!(order(&store), vec!["c1"]);
    }

    #[test]
    fn failed_first_load_transitions_to_error() {
        let mut store = store();

        store.begin_load();
        store.load_failed();

        assert_eq!(store.ui_state(), ConversationListUiState::Error);
    }

    #[test]
    fn incoming_message_updates_preview_and_moves_conversation_to_top() {
        let mut store = store();
        store.replace_all(vec![
            conversation("c1", "alice", 0, 300),
            conversation("c2", "bob", 0, 200),
        ]);

        let outcome = store.apply_incoming_message(&message("bob", ME, 400), None);

        assert_eq!(outcome, IncomingOutcome::Updated);
        assert_eq!(order(&store), vec!["c2", "c1"]);
        let bob = store
            .find_by_counterpart(&UserId::new("bob"))
            .expect("bob conversation");
        assert_eq!(bob.unread_count, 1);
        assert_eq!(bob.last_activity_ms, 400);
        assert_eq!(
            bob.last_message.as_ref().map(|summary| summary.content.as_str()),
            Some("from bob")
        );
    }

    #[test]
    fn own_message_never_increments_unread() {
        let mut store = store();
        store.replace_all(vec![conversation("c1", "alice", 2, 100)]);

        store.apply_incoming_message(&message(ME, "alice", 200), None);

        let alice = &store.conversations()[0];
        assert_eq!(alice.unread_count, 2);
        assert_eq!(
            alice.last_message.as_ref().map(|summary| summary.sender_id.as_str()),
            Some(ME)
        );
    }

    #[test]
    fn message_for_open_conversation_does_not_increment_unread() {
        let mut store = store();
        store.replace_all(vec![conversation("c1", "alice", 0, 100)]);
        let alice = UserId::new("alice");

        store.apply_incoming_message(&message("alice", ME, 200), Some(&alice));

        assert_eq!(store.conversations()[0].unread_count, 0);
    }

    #[test]
    fn message_from_unknown_counterpart_requires_reload() {
        let mut store = store();
        store.replace_all(vec![conversation("c1", "alice", 0, 100)]);

        let outcome = store.apply_incoming_message(&message("dave", ME, 200), None);

        assert_eq!(outcome, IncomingOutcome::ReloadRequired);
        assert_eq!(order(&store), vec!["c1"]);
    }

    #[test]
    fn mark_read_zeroes_unread_and_returns_counterpart() {
        let mut store = store();
        store.replace_all(vec![conversation("c1", "alice", 5, 100)]);

        let counterpart = store.mark_read(&ConversationId::new("c1"));

        assert_eq!(counterpart, Some(UserId::new("alice")));
        assert_eq!(store.conversations()[0].unread_count, 0);
        assert_eq!(store.total_unread(), 0);
    }

    #[test]
    fn mark_read_for_unknown_conversation_is_a_noop() {
        let mut store = store();

        assert_eq!(store.mark_read(&ConversationId::new("missing")), None);
    }

    #[test]
    fn selection_follows_conversation_when_it_moves() {
        let mut store = store();
        store.replace_all(vec![
            conversation("c1", "alice", 0, 300),
            conversation("c2", "bob", 0, 200),
        ]);
        store.select_next();
        assert_eq!(store.selected().map(|c| c.id.as_str()), Some("c2"));

        store.apply_incoming_message(&message("bob", ME, 400), None);

        assert_eq!(store.selected_index(), Some(0));
        assert_eq!(store.selected().map(|c| c.id.as_str()), Some("c2"));
    }

    #[test]
    fn selection_moves_within_bounds() {
        let mut store = store();
        store.replace_all(vec![
            conversation("c1", "alice", 0, 300),
            conversation("c2", "bob", 0, 200),
        ]);

        store.select_next();
        store.select_next();
        store.select_previous();

        assert_eq!(store.selected_index(), Some(0));
    }

    #[test]
    fn reload_preserves_selection_by_counterpart() {
        let mut store = store();
        store.replace_all(vec![
            conversation("c1", "alice", 0, 300),
            conversation("c2", "bob", 0, 200),
        ]);
        store.select_next();

        store.replace_all(vec![
            conversation("c9", "zed", 0, 900),
            conversation("c2", "bob", 0, 200),
        ]);

        assert_eq!(store.selected().map(|c| c.id.as_str()), Some("c2"));
    }
}
