//! JSON shapes shared by the Message Store API and the live channel.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    conversation::{Conversation, LastMessageSummary, Notification, Participant, ProjectRef},
    ids::{ConversationId, UserId},
    message::{DeliveryStatus, Message, MessageId},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("invalid timestamp in field `{field}`: {value}")]
    InvalidTimestamp { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WireStatus {
    Sending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl From<WireStatus> for DeliveryStatus {
    fn from(status: WireStatus) -> Self {
        match status {
            WireStatus::Sending => Self::Sending,
            WireStatus::Sent => Self::Sent,
            WireStatus::Delivered => Self::Delivered,
            WireStatus::Read => Self::Read,
            WireStatus::Failed => Self::Failed,
        }
    }
}

impl From<DeliveryStatus> for WireStatus {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Sending => Self::Sending,
            DeliveryStatus::Sent => Self::Sent,
            DeliveryStatus::Delivered => Self::Delivered,
            DeliveryStatus::Read => Self::Read,
            DeliveryStatus::Failed => Self::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WireStatus>,
}

impl TryFrom<MessageDto> for Message {
    type Error = WireError;

    fn try_from(dto: MessageDto) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at_ms: parse_timestamp("createdAt", &dto.created_at)?,
            id: MessageId::Server(dto.id),
            conversation_id: dto.conversation_id.map(ConversationId::new),
            sender_id: UserId::new(dto.sender_id),
            receiver_id: UserId::new(dto.receiver_id),
            content: dto.content,
            status: dto.status.map(DeliveryStatus::from).unwrap_or_default(),
        })
    }
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.to_string(),
            conversation_id: message
                .conversation_id
                .as_ref()
                .map(|id| id.as_str().to_owned()),
            sender_id: message.sender_id.as_str().to_owned(),
            receiver_id: message.receiver_id.as_str().to_owned(),
            content: message.content.clone(),
            created_at: format_timestamp(message.created_at_ms),
            status: Some(message.status.into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LastMessageDto {
    pub content: String,
    pub sender_id: String,
    pub created_at: String,
    #[serde(default)]
    pub status: Option<WireStatus>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDto {
    #[serde(alias = "_id")]
    pub id: String,
    pub other_user: ParticipantDto,
    #[serde(default)]
    pub project: Option<ProjectDto>,
    #[serde(default)]
    pub last_message: Option<LastMessageDto>,
    #[serde(default)]
    pub unread_count: u32,
    pub updated_at: String,
}

impl TryFrom<ConversationDto> for Conversation {
    type Error = WireError;

    fn try_from(dto: ConversationDto) -> Result<Self, Self::Error> {
        let last_message = dto
            .last_message
            .map(|last| -> Result<LastMessageSummary, WireError> {
                Ok(LastMessageSummary {
                    sent_at_ms: parse_timestamp("lastMessage.createdAt", &last.created_at)?,
                    content: last.content,
                    sender_id: UserId::new(last.sender_id),
                    status: last.status.map(DeliveryStatus::from).unwrap_or_default(),
                })
            })
            .transpose()?;

        Ok(Self {
            last_activity_ms: parse_timestamp("updatedAt", &dto.updated_at)?,
            id: ConversationId::new(dto.id),
            counterpart: Participant {
                id: UserId::new(dto.other_user.id),
                display_name: dto.other_user.name,
            },
            project: dto.project.map(|project| ProjectRef {
                id: project.id,
                title: project.title,
            }),
            last_message,
            unread_count: dto.unread_count,
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl From<NotificationDto> for Notification {
    fn from(dto: NotificationDto) -> Self {
        Self {
            kind: dto.kind,
            text: dto.message,
            link: dto.link,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub receiver_id: &'a str,
    pub content: &'a str,
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<i64, WireError> {
    DateTime::parse_from_rfc3339(value)
        .map(|datetime| datetime.timestamp_millis())
        .map_err(|_| WireError::InvalidTimestamp {
            field,
            value: value.to_owned(),
        })
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or_default()
        .to_rfc3339()
}
