use std::fmt;

use super::ids::{ConversationId, UserId};

/// Per-controller counter value assigned to an optimistic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalMessageId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Optimistic entry that the Message Store has not confirmed yet.
    Local(LocalMessageId),
    /// Identifier assigned by the Message Store.
    Server(String),
}

impl MessageId {
    pub fn local(&self) -> Option<LocalMessageId> {
        match self {
            Self::Local(id) => Some(*id),
            Self::Server(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(LocalMessageId(value)) => write!(f, "local-{value}"),
            Self::Server(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryStatus {
    Sending,
    #[default]
    Sent,
    Delivered,
    Read,
    Failed,
}

/// Things that can happen to a message after it enters a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryEvent {
    /// The Message Store confirmed the create call.
    Acknowledged,
    /// The Message Store rejected the create call.
    Rejected,
    /// The user asked to send a failed entry again.
    Retried,
}

impl DeliveryStatus {
    /// Returns the next status, or `None` when the event is not valid in the
    /// current status.
    pub fn transition(self, event: DeliveryEvent) -> Option<DeliveryStatus> {
        use DeliveryEvent as E;
        use DeliveryStatus as S;

        match (self, event) {
            (S::Sending, E::Acknowledged) => Some(S::Sent),
            (S::Sending, E::Rejected) => Some(S::Failed),
            (S::Sending, E::Retried) => None,

            // Late duplicate acknowledgments keep the more advanced status.
            (S::Sent | S::Delivered | S::Read, E::Acknowledged) => Some(self),
            (S::Sent | S::Delivered | S::Read, E::Rejected) => None,
            (S::Sent | S::Delivered | S::Read, E::Retried) => None,

            (S::Failed, E::Retried) => Some(S::Sending),
            (S::Failed, E::Acknowledged) => None,
            (S::Failed, E::Rejected) => Some(S::Failed),
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: Option<ConversationId>,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub created_at_ms: i64,
    pub status: DeliveryStatus,
}

impl Message {
    /// The participant on the other side of this message, seen from `local_user`.
    pub fn counterpart_of(&self, local_user: &UserId) -> &UserId {
        if &self.sender_id == local_user {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }

    pub fn is_authored_by(&self, user: &UserId) -> bool {
        &self.sender_id == user
    }
}
