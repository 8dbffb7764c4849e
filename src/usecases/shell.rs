use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;

use crate::{
    domain::{
        conversation_store::IncomingOutcome,
        events::{ChannelSignal, ConnectionState, InboundEvent, OutboundEvent},
        ids::UserId,
        message::{LocalMessageId, Message},
        message_thread::{PendingSend, SendRejected},
        shell_state::{ActivePane, ShellState},
    },
    sync::{
        notification_router::{NotificationRouter, Subscription, Topic},
        transport::{ChannelConnector, TransportError},
    },
};

use super::{
    contracts::{AppEvent, KeyInput, ShellOrchestrator},
    send_message::SendMessageError,
    session::{AuthState, SessionChange, SessionSlot},
    store_dispatcher::{StoreDispatcher, StoreRequest, StoreResponse},
};

const SHELL_LIVE_EMIT_SKIPPED: &str = "SHELL_LIVE_EMIT_SKIPPED";
const SHELL_AUTH_LOST: &str = "SHELL_AUTH_LOST";
const SHELL_STORE_REQUEST_FAILED: &str = "SHELL_STORE_REQUEST_FAILED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSettings {
    pub local_user: UserId,
    pub typing_quiet_window: Duration,
    pub typing_emit_interval: Duration,
    pub max_message_chars: usize,
}

#[cfg(test)]
impl ShellSettings {
    pub fn for_user(local_user: UserId) -> Self {
        Self {
            local_user,
            typing_quiet_window: crate::domain::presence::DEFAULT_TYPING_QUIET_WINDOW,
            typing_emit_interval: Duration::from_secs(1),
            max_message_chars: crate::domain::compose::DEFAULT_MAX_MESSAGE_CHARS,
        }
    }
}

/// Emits at most one `typing` per interval and receiver.
#[derive(Debug)]
struct TypingThrottle {
    interval: Duration,
    last_emit: Option<(UserId, Instant)>,
}

impl TypingThrottle {
    fn should_emit(&mut self, receiver: &UserId, now: Instant) -> bool {
        if let Some((last_receiver, at)) = &self.last_emit {
            if last_receiver == receiver && now.duration_since(*at) < self.interval {
                return false;
            }
        }

        self.last_emit = Some((receiver.clone(), now));
        true
    }
}

#[derive(Debug)]
struct Feeds {
    connection: Subscription,
    presence: Subscription,
    conversations: Subscription,
    notifications: Subscription,
    /// Mounted while a thread is open.
    thread: Option<Subscription>,
}

pub struct DefaultShellOrchestrator<C, D>
where
    C: ChannelConnector + Clone + 'static,
    D: StoreDispatcher,
{
    state: ShellState,
    session: SessionSlot<C>,
    router: NotificationRouter,
    feeds: Feeds,
    store: D,
    typing: TypingThrottle,
    connected_once: bool,
}

impl<C, D> DefaultShellOrchestrator<C, D>
where
    C: ChannelConnector + Clone + 'static,
    D: StoreDispatcher,
{
    pub fn new(settings: ShellSettings, connector: C, store: D) -> Self {
        let mut router = NotificationRouter::new();
        let feeds = Feeds {
            connection: router.subscribe(&[Topic::Connection]),
            presence: router.subscribe(&[Topic::Presence, Topic::Typing]),
            conversations: router.subscribe(&[Topic::Messages]),
            notifications: router.subscribe(&[Topic::Notifications]),
            thread: None,
        };

        Self {
            state: ShellState::new(settings.local_user, settings.typing_quiet_window)
                .with_compose_limit(settings.max_message_chars),
            session: SessionSlot::new(connector),
            router,
            feeds,
            store,
            typing: TypingThrottle {
                interval: settings.typing_emit_interval,
                last_emit: None,
            },
            connected_once: false,
        }
    }

    fn request(&self, request: StoreRequest) {
        if !self.state.is_authenticated() {
            tracing::debug!(?request, "skipping store request without authentication");
            return;
        }
        self.store.dispatch(request);
    }

    fn request_conversations(&mut self) {
        self.state.conversations_mut().begin_load();
        self.request(StoreRequest::LoadConversations);
    }

    fn sync_connection_state(&mut self) {
        let connection_state = self.session.connection_state();
        self.state.set_connection_state(connection_state);
    }

    /// A connect attempt that failed right away is reported the same way as a
    /// channel that went down.
    fn on_connect_result(&mut self, result: Result<(), TransportError>) {
        self.sync_connection_state();
        if result.is_err() {
            self.router.publish(InboundEvent::Disconnect);
            self.drain_feeds();
        }
    }

    fn handle_channel(&mut self, session: u64, signal: ChannelSignal) {
        let Some(frame) = self
            .session
            .transport_mut()
            .and_then(|transport| transport.receive(session, signal))
        else {
            return;
        };

        self.sync_connection_state();
        self.router.dispatch(frame);
        self.drain_feeds();
    }

    fn drain_feeds(&mut self) {
        for event in self.feeds.connection.drain() {
            match event {
                InboundEvent::Connect => self.on_connected(),
                InboundEvent::Disconnect => {
                    self.state.presence_mut().reset();
                    if self.state.is_authenticated() {
                        self.state
                            .set_notice("Live updates disconnected. Press c to reconnect.");
                    }
                }
                _ => {}
            }
        }

        let now = Instant::now();
        for event in self.feeds.presence.drain() {
            let presence = self.state.presence_mut();
            match event {
                InboundEvent::UserOnline(user) => presence.on_user_online(user),
                InboundEvent::UserOffline(user) => presence.on_user_offline(user),
                InboundEvent::UserTyping { sender_id } => presence.on_user_typing(sender_id, now),
                _ => {}
            }
        }

        for event in self.feeds.conversations.drain() {
            if let InboundEvent::NewMessage(message) = event {
                self.apply_to_conversations(&message);
            }
        }

        let thread_events = self
            .feeds
            .thread
            .as_ref()
            .map(Subscription::drain)
            .unwrap_or_default();
        for event in thread_events {
            if let InboundEvent::NewMessage(message) = event {
                let sender = message.sender_id.clone();
                if self.state.thread_mut().apply_live(message) {
                    self.request(StoreRequest::MarkRead(sender));
                }
            }
        }

        for event in self.feeds.notifications.drain() {
            if let InboundEvent::Notification(notification) = event {
                self.state.set_notice(notification.text);
            }
        }
    }

    /// After a reconnect, whatever was missed while offline is picked up by
    /// reloading from the store.
    fn on_connected(&mut self) {
        self.state.clear_notice();
        if !self.connected_once {
            self.connected_once = true;
            return;
        }

        self.request_conversations();
        if let Some(ticket) = self.state.thread_mut().reload() {
            self.request(StoreRequest::LoadMessages(ticket));
        }
    }

    fn apply_to_conversations(&mut self, message: &Message) {
        let open = self.state.thread().counterpart().cloned();
        let outcome = self
            .state
            .conversations_mut()
            .apply_incoming_message(message, open.as_ref());

        if outcome == IncomingOutcome::ReloadRequired {
            self.request(StoreRequest::LoadConversations);
        }
    }

    fn emit_live(&self, event: OutboundEvent) {
        let Some(transport) = self.session.transport() else {
            return;
        };

        if let Err(error) = transport.send(event) {
            tracing::debug!(
                code = SHELL_LIVE_EMIT_SKIPPED,
                error = %error,
                "live emit rejected"
            );
        }
    }

    fn emit_typing(&mut self) {
        let Some(receiver) = self.state.thread().counterpart().cloned() else {
            return;
        };

        // The throttle only counts emits the transport will accept.
        if self.session.connection_state() == ConnectionState::Disconnected
            || !self.typing.should_emit(&receiver, Instant::now())
        {
            return;
        }

        self.emit_live(OutboundEvent::Typing {
            sender_id: self.state.local_user().clone(),
            receiver_id: receiver,
        });
    }

    fn handle_key(&mut self, key: KeyInput) {
        if key.ctrl {
            return;
        }

        match self.state.active_pane() {
            ActivePane::Conversations => match key.key.as_str() {
                "j" | "down" => self.state.conversations_mut().select_next(),
                "k" | "up" => self.state.conversations_mut().select_previous(),
                "l" | "right" | "enter" => self.open_selected(),
                "r" => self.request_conversations(),
                "c" => self.reconnect(),
                "q" => self.shutdown(),
                _ => {}
            },
            ActivePane::Messages => match key.key.as_str() {
                "j" | "down" => self.state.thread_mut().select_next(),
                "k" | "up" => self.state.thread_mut().select_previous(),
                "i" => self.state.set_active_pane(ActivePane::Compose),
                "h" | "left" | "esc" => self.state.set_active_pane(ActivePane::Conversations),
                "r" => {
                    if let Some(ticket) = self.state.thread_mut().reload() {
                        self.request(StoreRequest::LoadMessages(ticket));
                    }
                }
                "R" => self.retry_selected(),
                "d" => self.discard_selected(),
                "c" => self.reconnect(),
                "q" => self.shutdown(),
                _ => {}
            },
            ActivePane::Compose => self.handle_compose_key(&key.key),
        }
    }

    fn handle_compose_key(&mut self, key: &str) {
        match key {
            "esc" => return self.state.set_active_pane(ActivePane::Messages),
            "enter" => return self.submit_compose(),
            _ => {}
        }

        let compose = self.state.compose_mut();
        match key {
            "backspace" => compose.backspace(),
            "delete" => compose.delete(),
            "left" => compose.move_left(),
            "right" => compose.move_right(),
            "home" => compose.move_home(),
            "end" => compose.move_end(),
            other => {
                let mut chars = other.chars();
                if let (Some(ch), None) = (chars.next(), chars.next()) {
                    if compose.insert(ch) {
                        self.emit_typing();
                    }
                }
            }
        }
    }

    fn open_selected(&mut self) {
        let Some(conversation) = self.state.conversations().selected().cloned() else {
            return;
        };

        let ticket = self.state.thread_mut().open(&conversation);
        if self.feeds.thread.is_none() {
            self.feeds.thread = Some(self.router.subscribe(&[Topic::Messages]));
        }
        self.state.set_active_pane(ActivePane::Messages);
        self.request(StoreRequest::LoadMessages(ticket));

        if conversation.unread_count > 0 {
            if let Some(counterpart) = self.state.conversations_mut().mark_read(&conversation.id) {
                self.request(StoreRequest::MarkRead(counterpart));
            }
        }
    }

    fn submit_compose(&mut self) {
        if !self.state.is_authenticated() {
            self.state
                .set_notice("Session is not authorized; messages cannot be sent.");
            return;
        }

        let Some(text) = self.state.compose().submission().map(str::to_owned) else {
            return;
        };
        let now_ms = Utc::now().timestamp_millis();
        match self.state.thread_mut().send(&text, now_ms) {
            Ok(pending) => {
                self.state.compose_mut().clear();
                self.submit(pending);
            }
            Err(SendRejected::EmptyMessage) => {}
            Err(SendRejected::NoOpenConversation) => {
                self.state.set_notice("Open a conversation first.");
            }
        }
    }

    fn selected_local_id(&self) -> Option<LocalMessageId> {
        self.state.thread().selected().and_then(|message| message.id.local())
    }

    fn retry_selected(&mut self) {
        let Some(local_id) = self.selected_local_id() else {
            return;
        };

        let retried: Option<PendingSend> = self.state.thread_mut().retry(local_id);
        if let Some(pending) = retried {
            self.submit(pending);
        }
    }

    /// The create call and the live emit go out side by side; only the
    /// create call decides the entry's fate.
    fn submit(&mut self, pending: PendingSend) {
        let live = OutboundEvent::SendMessage {
            sender_id: self.state.local_user().clone(),
            receiver_id: pending.receiver_id.clone(),
            message: pending.message.clone(),
        };
        self.request(StoreRequest::SendMessage(pending));
        self.emit_live(live);
    }

    fn discard_selected(&mut self) {
        if let Some(local_id) = self.selected_local_id() {
            self.state.thread_mut().discard(local_id);
        }
    }

    fn reconnect(&mut self) {
        if !self.state.is_authenticated() {
            self.state
                .set_notice("Session is not authorized; live updates stay off.");
            return;
        }

        match self.session.reconnect() {
            Ok(()) => {
                self.state.set_notice("Reconnecting live updates...");
                self.on_connect_result(Ok(()));
            }
            Err(TransportError::AlreadyConnected) => {}
            Err(error) => self.on_connect_result(Err(error)),
        }
    }

    fn handle_store(&mut self, response: StoreResponse) {
        let unauthorized = response.is_unauthorized();

        match response {
            StoreResponse::ConversationsLoaded(Ok(conversations)) => {
                self.state.conversations_mut().replace_all(conversations);
            }
            StoreResponse::ConversationsLoaded(Err(error)) => {
                tracing::warn!(
                    code = SHELL_STORE_REQUEST_FAILED,
                    request = "list_conversations",
                    ?error,
                    "conversation list could not be loaded"
                );
                self.state.conversations_mut().load_failed();
                self.state.set_notice("Could not load conversations. Press r to retry.");
            }
            StoreResponse::MessagesLoaded { ticket, result } => match result {
                Ok(history) => {
                    self.state.thread_mut().apply_history(&ticket, history);
                }
                Err(error) => {
                    tracing::warn!(
                        code = SHELL_STORE_REQUEST_FAILED,
                        request = "load_messages",
                        ?error,
                        "thread history could not be loaded"
                    );
                    self.state.thread_mut().history_failed(&ticket);
                }
            },
            StoreResponse::MessageSent { local_id, result } => match result {
                Ok(message) => self.on_message_confirmed(local_id, message),
                Err(error) => self.on_message_failed(local_id, error),
            },
            StoreResponse::ReadMarked {
                other_user_id,
                result: Err(error),
            } => {
                tracing::warn!(
                    code = SHELL_STORE_REQUEST_FAILED,
                    request = "mark_read",
                    other_user_id = %other_user_id,
                    ?error,
                    "read receipt was not accepted"
                );
            }
            StoreResponse::ReadMarked { result: Ok(()), .. } => {}
        }

        if unauthorized {
            self.lose_authentication();
        }
    }

    fn on_message_confirmed(&mut self, local_id: LocalMessageId, message: Message) {
        self.state.thread_mut().acknowledge(local_id, message.clone());
        self.apply_to_conversations(&message);
    }

    fn on_message_failed(&mut self, local_id: LocalMessageId, error: SendMessageError) {
        tracing::warn!(
            code = SHELL_STORE_REQUEST_FAILED,
            request = "send_message",
            local_id = local_id.0,
            ?error,
            "message was not accepted"
        );

        let Some(content) = self.state.thread_mut().fail(local_id) else {
            return;
        };

        self.state.compose_mut().restore_failed(&content);
        self.state
            .set_notice("Message not sent. Select it and press R to retry or d to discard.");
    }

    fn lose_authentication(&mut self) {
        if !self.state.is_authenticated() {
            return;
        }

        tracing::warn!(code = SHELL_AUTH_LOST, "message store rejected the session");
        self.state.set_authenticated(false);
        if self.session.on_auth_changed(AuthState::Unauthenticated) == SessionChange::Released {
            self.router.publish(InboundEvent::Disconnect);
            self.drain_feeds();
        }
        self.sync_connection_state();
        self.state
            .set_notice("Session is no longer authorized. Update [session] token and restart.");
    }

    fn shutdown(&mut self) {
        self.state.stop();
        self.session.release();
        self.sync_connection_state();
    }
}

impl<C, D> ShellOrchestrator for DefaultShellOrchestrator<C, D>
where
    C: ChannelConnector + Clone + 'static,
    D: StoreDispatcher,
{
    fn state(&self) -> &ShellState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ShellState {
        &mut self.state
    }

    fn start(&mut self) -> Result<()> {
        self.state.set_authenticated(true);
        let user = self.state.local_user().clone();
        if let SessionChange::Acquired { connect } =
            self.session.on_auth_changed(AuthState::Authenticated(user))
        {
            self.on_connect_result(connect);
        }

        self.request_conversations();
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Tick => {
                self.state.presence_mut().expire(Instant::now());
            }
            AppEvent::QuitRequested => self.shutdown(),
            AppEvent::InputKey(key) => self.handle_key(key),
            AppEvent::Channel { session, signal } => self.handle_channel(session, signal),
            AppEvent::Store(response) => self.handle_store(response),
        }

        Ok(())
    }
}
