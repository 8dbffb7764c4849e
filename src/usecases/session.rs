//! Ties the single live channel to the authentication signal.

use crate::{
    domain::{events::ConnectionState, ids::UserId},
    sync::transport::{ChannelConnector, TransportConnection, TransportError},
};

const SESSION_ACQUIRED: &str = "SESSION_ACQUIRED";
const SESSION_RELEASED: &str = "SESSION_RELEASED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated(UserId),
    Unauthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Unchanged,
    /// A transport was created; `connect` carries the result of the first
    /// connect attempt.
    Acquired {
        connect: Result<(), TransportError>,
    },
    Released,
}

struct ActiveSession {
    user_id: UserId,
    transport: TransportConnection,
}

/// Holds at most one [`TransportConnection`]. A new one is only created
/// after the previous one was torn down.
pub struct SessionSlot<C>
where
    C: ChannelConnector + Clone + 'static,
{
    connector: C,
    active: Option<ActiveSession>,
}

impl<C> SessionSlot<C>
where
    C: ChannelConnector + Clone + 'static,
{
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            active: None,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.active.as_ref().map(|active| &active.user_id)
    }

    pub fn transport(&self) -> Option<&TransportConnection> {
        self.active.as_ref().map(|active| &active.transport)
    }

    pub fn transport_mut(&mut self) -> Option<&mut TransportConnection> {
        self.active.as_mut().map(|active| &mut active.transport)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport()
            .map(TransportConnection::state)
            .unwrap_or_default()
    }

    pub fn on_auth_changed(&mut self, auth: AuthState) -> SessionChange {
        match auth {
            AuthState::Authenticated(user_id) => {
                if self.user_id() == Some(&user_id) {
                    return SessionChange::Unchanged;
                }

                self.release();
                let mut transport = TransportConnection::new(Box::new(self.connector.clone()));
                let connect = transport.connect(user_id.clone());
                tracing::info!(
                    code = SESSION_ACQUIRED,
                    user_id = %user_id,
                    connected = connect.is_ok(),
                    "live session acquired"
                );
                self.active = Some(ActiveSession { user_id, transport });
                SessionChange::Acquired { connect }
            }
            AuthState::Unauthenticated => {
                if self.release() {
                    SessionChange::Released
                } else {
                    SessionChange::Unchanged
                }
            }
        }
    }

    /// Opens a fresh channel for the current user after the previous one
    /// went away. Manual only; nothing calls this on a timer.
    pub fn reconnect(&mut self) -> Result<(), TransportError> {
        let Some(active) = self.active.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        if active.transport.state() != ConnectionState::Disconnected {
            return Err(TransportError::AlreadyConnected);
        }

        active.transport.connect(active.user_id.clone())
    }

    /// Tears the transport down. Returns false when nothing was held.
    pub fn release(&mut self) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };

        active.transport.disconnect();
        tracing::info!(
            code = SESSION_RELEASED,
            user_id = %active.user_id,
            "live session released"
        );
        true
    }
}
