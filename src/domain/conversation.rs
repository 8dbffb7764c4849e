use super::{
    ids::{ConversationId, UserId},
    message::{DeliveryStatus, Message},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
}

/// Marketplace project a conversation was started from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastMessageSummary {
    pub content: String,
    pub sender_id: UserId,
    pub sent_at_ms: i64,
    pub status: DeliveryStatus,
}

impl From<&Message> for LastMessageSummary {
    fn from(message: &Message) -> Self {
        Self {
            content: message.content.clone(),
            sender_id: message.sender_id.clone(),
            sent_at_ms: message.created_at_ms,
            status: message.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub counterpart: Participant,
    pub project: Option<ProjectRef>,
    pub last_message: Option<LastMessageSummary>,
    pub unread_count: u32,
    pub last_activity_ms: i64,
}

impl Conversation {
    pub fn counterpart_id(&self) -> &UserId {
        &self.counterpart.id
    }

    /// Title shown in lists and headers: the counterpart, plus the project if any.
    pub fn title(&self) -> String {
        match &self.project {
            Some(project) => format!("{} · {}", self.counterpart.display_name, project.title),
            None => self.counterpart.display_name.clone(),
        }
    }
}

/// Notification pushed by the backend over the live channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: Option<String>,
    pub text: String,
    pub link: Option<String>,
}
