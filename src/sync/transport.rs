use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::domain::{
    events::{ChannelSignal, ConnectionState, InboundEvent, OutboundEvent},
    ids::UserId,
};

const TRANSPORT_CONNECT_REQUESTED: &str = "TRANSPORT_CONNECT_REQUESTED";
const TRANSPORT_CONNECT_FAILED: &str = "TRANSPORT_CONNECT_FAILED";
const TRANSPORT_CHANNEL_OPENED: &str = "TRANSPORT_CHANNEL_OPENED";
const TRANSPORT_CHANNEL_CLOSED: &str = "TRANSPORT_CHANNEL_CLOSED";
const TRANSPORT_RELEASED: &str = "TRANSPORT_RELEASED";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("a live channel is already open for this session")]
    AlreadyConnected,
    #[error("live channel is not connected")]
    NotConnected,
    #[error("live channel was closed")]
    ChannelClosed,
    #[error("invalid live channel endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Something the router has to look at after a channel signal was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Event(InboundEvent),
    Raw(String),
}

/// Receives what channel tasks report, tagged with their transport session.
pub trait SignalSink: Send + Sync {
    /// Returns false once nobody is listening anymore.
    fn deliver(&self, session: u64, signal: ChannelSignal) -> bool;
}

/// Opens the concrete bidirectional channel for one transport session.
///
/// Implementations report lifecycle and inbound frames as
/// [`ChannelSignal`]s tagged with `session`, and write whatever arrives on the
/// handle's outbound queue once the channel is up.
pub trait ChannelConnector {
    fn open(&self, session: u64, user_id: &UserId) -> Result<ChannelHandle, TransportError>;
}

/// Owning end of an open channel. Dropping it asks the channel to shut down.
#[derive(Debug)]
pub struct ChannelHandle {
    outbound: mpsc::UnboundedSender<OutboundEvent>,
    stop_tx: Option<watch::Sender<bool>>,
}

impl ChannelHandle {
    pub fn new(
        outbound: mpsc::UnboundedSender<OutboundEvent>,
        stop_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            outbound,
            stop_tx: Some(stop_tx),
        }
    }

    fn send(&self, event: OutboundEvent) -> Result<(), TransportError> {
        self.outbound
            .send(event)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
    }
}

/// The single live channel of an authenticated session.
pub struct TransportConnection {
    connector: Box<dyn ChannelConnector>,
    state: ConnectionState,
    session: u64,
    user_id: Option<UserId>,
    channel: Option<ChannelHandle>,
}

impl std::fmt::Debug for TransportConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConnection")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl TransportConnection {
    pub fn new(connector: Box<dyn ChannelConnector>) -> Self {
        Self {
            connector,
            state: ConnectionState::Disconnected,
            session: 0,
            user_id: None,
            channel: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[cfg(test)]
    fn session(&self) -> u64 {
        self.session
    }

    /// Opens the channel and queues `join(user_id)` ahead of anything else.
    /// A failed attempt is not retried here.
    pub fn connect(&mut self, user_id: UserId) -> Result<(), TransportError> {
        if self.channel.is_some() {
            return Err(TransportError::AlreadyConnected);
        }

        self.session = self.session.wrapping_add(1);
        self.state = ConnectionState::Connecting;
        tracing::info!(
            code = TRANSPORT_CONNECT_REQUESTED,
            session = self.session,
            user_id = %user_id,
            "opening live channel"
        );

        let handle = match self.connector.open(self.session, &user_id) {
            Ok(handle) => handle,
            Err(error) => {
                self.state = ConnectionState::Disconnected;
                tracing::warn!(
                    code = TRANSPORT_CONNECT_FAILED,
                    session = self.session,
                    error = %error,
                    "live channel could not be opened"
                );
                return Err(error);
            }
        };

        if let Err(error) = handle.send(OutboundEvent::Join {
            user_id: user_id.clone(),
        }) {
            self.state = ConnectionState::Disconnected;
            return Err(error);
        }
        self.channel = Some(handle);
        self.user_id = Some(user_id);
        Ok(())
    }

    /// Releases the channel. Safe to call in any state.
    pub fn disconnect(&mut self) -> bool {
        let released = self.channel.take().is_some();
        self.state = ConnectionState::Disconnected;

        if released {
            tracing::info!(
                code = TRANSPORT_RELEASED,
                session = self.session,
                "live channel released"
            );
        }
        released
    }

    /// Fire-and-forget emit. Rejected locally while disconnected; while
    /// connecting the channel holds it until it is up.
    pub fn send(&self, event: OutboundEvent) -> Result<(), TransportError> {
        let Some(channel) = self.channel.as_ref() else {
            return Err(TransportError::NotConnected);
        };

        if self.state == ConnectionState::Disconnected {
            return Err(TransportError::NotConnected);
        }

        tracing::trace!(event = event.name(), "queueing outbound event");
        channel.send(event)
    }

    /// Applies a channel signal. Signals from sessions that were already torn
    /// down yield nothing.
    pub fn receive(&mut self, session: u64, signal: ChannelSignal) -> Option<InboundFrame> {
        if session != self.session || self.channel.is_none() {
            tracing::debug!(
                session,
                current_session = self.session,
                "ignoring signal from released live channel"
            );
            return None;
        }

        match signal {
            ChannelSignal::Opened => {
                self.state = ConnectionState::Connected;
                tracing::info!(
                    code = TRANSPORT_CHANNEL_OPENED,
                    session,
                    "live channel connected"
                );
                Some(InboundFrame::Event(InboundEvent::Connect))
            }
            ChannelSignal::Closed { reason } => {
                self.channel = None;
                self.state = ConnectionState::Disconnected;
                tracing::warn!(
                    code = TRANSPORT_CHANNEL_CLOSED,
                    session,
                    reason = reason.as_deref().unwrap_or("none"),
                    "live channel closed"
                );
                Some(InboundFrame::Event(InboundEvent::Disconnect))
            }
            ChannelSignal::Frame(raw) => Some(InboundFrame::Raw(raw)),
        }
    }
}

impl Drop for TransportConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}
