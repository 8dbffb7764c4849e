use super::{conversation::Notification, ids::UserId, message::Message};

/// Raw lifecycle and frame notifications produced by a channel implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSignal {
    Opened,
    Closed { reason: Option<String> },
    Frame(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Connect,
    Disconnect,
    NewMessage(Message),
    Notification(Notification),
    UserTyping { sender_id: UserId },
    UserOnline(UserId),
    UserOffline(UserId),
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::NewMessage(_) => "newMessage",
            Self::Notification(_) => "notification",
            Self::UserTyping { .. } => "userTyping",
            Self::UserOnline(_) => "userOnline",
            Self::UserOffline(_) => "userOffline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    Join {
        user_id: UserId,
    },
    SendMessage {
        sender_id: UserId,
        receiver_id: UserId,
        message: Message,
    },
    Typing {
        sender_id: UserId,
        receiver_id: UserId,
    },
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::SendMessage { .. } => "sendMessage",
            Self::Typing { .. } => "typing",
        }
    }
}
