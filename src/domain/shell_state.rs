use std::time::Duration;

use super::{
    compose::ComposeDraft,
    conversation_store::ConversationStore,
    events::ConnectionState,
    ids::UserId,
    message_thread::MessageThreadController,
    presence::PresenceTracker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Conversations,
    Messages,
    Compose,
}

#[derive(Debug, Clone)]
pub struct ShellState {
    running: bool,
    local_user: UserId,
    active_pane: ActivePane,
    connection_state: ConnectionState,
    authenticated: bool,
    notice: Option<String>,
    conversations: ConversationStore,
    thread: MessageThreadController,
    presence: PresenceTracker,
    compose: ComposeDraft,
}

impl ShellState {
    pub fn new(local_user: UserId, typing_quiet_window: Duration) -> Self {
        Self {
            running: true,
            conversations: ConversationStore::new(local_user.clone()),
            thread: MessageThreadController::new(local_user.clone()),
            local_user,
            active_pane: ActivePane::Conversations,
            connection_state: ConnectionState::Disconnected,
            authenticated: false,
            notice: None,
            presence: PresenceTracker::new(typing_quiet_window),
            compose: ComposeDraft::default(),
        }
    }

    /// Caps the compose box at `max_chars` characters.
    pub fn with_compose_limit(mut self, max_chars: usize) -> Self {
        self.compose = ComposeDraft::with_limit(max_chars);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn local_user(&self) -> &UserId {
        &self.local_user
    }

    pub fn active_pane(&self) -> ActivePane {
        self.active_pane
    }

    pub fn set_active_pane(&mut self, pane: ActivePane) {
        self.active_pane = pane;
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn set_connection_state(&mut self, state: ConnectionState) {
        self.connection_state = state;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.authenticated = authenticated;
    }

    /// One-line message for the status bar; replaced by the next one.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn conversations_mut(&mut self) -> &mut ConversationStore {
        &mut self.conversations
    }

    pub fn thread(&self) -> &MessageThreadController {
        &self.thread
    }

    pub fn thread_mut(&mut self) -> &mut MessageThreadController {
        &mut self.thread
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn presence_mut(&mut self) -> &mut PresenceTracker {
        &mut self.presence
    }

    pub fn compose(&self) -> &ComposeDraft {
        &self.compose
    }

    pub fn compose_mut(&mut self) -> &mut ComposeDraft {
        &mut self.compose
    }
}
