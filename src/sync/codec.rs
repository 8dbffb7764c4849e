//! JSON envelope of the live channel: `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{
        events::{InboundEvent, OutboundEvent},
        ids::UserId,
        message::Message,
    },
    infra::wire::{MessageDto, NotificationDto, WireError},
};

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("frame is not a known event envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("event payload is invalid: {0}")]
    Payload(#[from] WireError),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
enum InboundFrame {
    Connect,
    Disconnect,
    NewMessage(MessageDto),
    Notification(NotificationDto),
    UserTyping(TypingPayload),
    UserOnline(String),
    UserOffline(String),
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
enum OutboundFrame<'a> {
    Join(&'a str),
    SendMessage(SendMessagePayload<'a>),
    Typing(TypingRoute<'a>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypingPayload {
    sender_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessagePayload<'a> {
    sender_id: &'a str,
    receiver_id: &'a str,
    message: MessageDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TypingRoute<'a> {
    sender_id: &'a str,
    receiver_id: &'a str,
}

pub fn decode_inbound(raw: &str) -> Result<InboundEvent, EventDecodeError> {
    let frame: InboundFrame = serde_json::from_str(raw)?;

    let event = match frame {
        InboundFrame::Connect => InboundEvent::Connect,
        InboundFrame::Disconnect => InboundEvent::Disconnect,
        InboundFrame::NewMessage(dto) => InboundEvent::NewMessage(Message::try_from(dto)?),
        InboundFrame::Notification(dto) => InboundEvent::Notification(dto.into()),
        InboundFrame::UserTyping(payload) => InboundEvent::UserTyping {
            sender_id: UserId::new(payload.sender_id),
        },
        InboundFrame::UserOnline(user) => InboundEvent::UserOnline(UserId::new(user)),
        InboundFrame::UserOffline(user) => InboundEvent::UserOffline(UserId::new(user)),
    };

    Ok(event)
}

pub fn encode_outbound(event: &OutboundEvent) -> Result<String, serde_json::Error> {
    let frame = match event {
        OutboundEvent::Join { user_id } => OutboundFrame::Join(user_id.as_str()),
        OutboundEvent::SendMessage {
            sender_id,
            receiver_id,
            message,
        } => OutboundFrame::SendMessage(SendMessagePayload {
            sender_id: sender_id.as_str(),
            receiver_id: receiver_id.as_str(),
            message: MessageDto::from(message),
        }),
        OutboundEvent::Typing {
            sender_id,
            receiver_id,
        } => OutboundFrame::Typing(TypingRoute {
            sender_id: sender_id.as_str(),
            receiver_id: receiver_id.as_str(),
        }),
    };

    serde_json::to_string(&frame)
}
