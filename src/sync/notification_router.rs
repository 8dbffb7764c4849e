//! Typed fan-out of inbound live-channel events.
//!
//! Screens and trackers mount and unmount independently of the channel. Each
//! consumer holds a [`Subscription`] for the topics it cares about; dropping
//! it unsubscribes. Publishing with nobody listening is a no-op.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::domain::events::InboundEvent;

use super::{codec::decode_inbound, transport::InboundFrame};

const ROUTER_EVENT_MALFORMED: &str = "ROUTER_EVENT_MALFORMED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Connection,
    Messages,
    Notifications,
    Typing,
    Presence,
}

impl Topic {
    pub fn of(event: &InboundEvent) -> Self {
        match event {
            InboundEvent::Connect | InboundEvent::Disconnect => Self::Connection,
            InboundEvent::NewMessage(_) => Self::Messages,
            InboundEvent::Notification(_) => Self::Notifications,
            InboundEvent::UserTyping { .. } => Self::Typing,
            InboundEvent::UserOnline(_) | InboundEvent::UserOffline(_) => Self::Presence,
        }
    }
}

#[derive(Debug)]
struct Subscriber {
    topics: Vec<Topic>,
    tx: Sender<InboundEvent>,
}

#[derive(Debug, Default)]
pub struct NotificationRouter {
    subscribers: Vec<Subscriber>,
}

#[derive(Debug)]
pub struct Subscription {
    rx: Receiver<InboundEvent>,
}

impl Subscription {
    /// Takes everything published since the last drain, in publish order.
    pub fn drain(&self) -> Vec<InboundEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return events,
            }
        }
    }
}

impl NotificationRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, topics: &[Topic]) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(Subscriber {
            topics: topics.to_vec(),
            tx,
        });
        Subscription { rx }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers `event` to every live subscriber of its topic. Returns how many
    /// received it.
    pub fn publish(&mut self, event: InboundEvent) -> usize {
        let topic = Topic::of(&event);
        let mut delivered = 0;

        self.subscribers.retain(|subscriber| {
            if !subscriber.topics.contains(&topic) {
                return true;
            }

            let alive = subscriber.tx.send(event.clone()).is_ok();
            if alive {
                delivered += 1;
            }
            alive
        });

        tracing::trace!(event = event.name(), delivered, "inbound event routed");
        delivered
    }

    /// Decodes raw frames before publishing. Malformed frames are logged and
    /// dropped.
    pub fn dispatch(&mut self, frame: InboundFrame) -> usize {
        let event = match frame {
            InboundFrame::Event(event) => event,
            InboundFrame::Raw(raw) => match decode_inbound(&raw) {
                Ok(event) => event,
                Err(error) => {
                    tracing::warn!(
                        code = ROUTER_EVENT_MALFORMED,
                        error = %error,
                        frame_len = raw.len(),
                        "dropping malformed live channel frame"
                    );
                    return 0;
                }
            },
        };

        self.publish(event)
    }
}
