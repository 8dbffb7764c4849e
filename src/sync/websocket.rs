use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        handshake::client::Request,
        http::{header::AUTHORIZATION, HeaderValue},
        Message as WsMessage,
    },
};

use crate::domain::{
    events::{ChannelSignal, OutboundEvent},
    ids::UserId,
};

use super::{
    codec::encode_outbound,
    transport::{ChannelConnector, ChannelHandle, SignalSink, TransportError},
};

const CHANNEL_TASK_STARTED: &str = "TRANSPORT_CHANNEL_TASK_STARTED";
const CHANNEL_TASK_STOPPED: &str = "TRANSPORT_CHANNEL_TASK_STOPPED";
const CHANNEL_HANDSHAKE_FAILED: &str = "TRANSPORT_CHANNEL_HANDSHAKE_FAILED";
const CHANNEL_ENCODE_FAILED: &str = "TRANSPORT_CHANNEL_ENCODE_FAILED";
const CHANNEL_SIGNAL_SEND_FAILED: &str = "TRANSPORT_CHANNEL_SIGNAL_SEND_FAILED";

/// Live channel over a WebSocket, driven by a task on the shared runtime.
#[derive(Clone)]
pub struct WebSocketConnector {
    runtime: Handle,
    events_url: String,
    token: String,
    sink: Arc<dyn SignalSink>,
}

impl std::fmt::Debug for WebSocketConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketConnector")
            .field("events_url", &self.events_url)
            .finish_non_exhaustive()
    }
}

impl WebSocketConnector {
    pub fn new(
        runtime: Handle,
        events_url: impl Into<String>,
        token: impl Into<String>,
        sink: Arc<dyn SignalSink>,
    ) -> Self {
        Self {
            runtime,
            events_url: events_url.into(),
            token: token.into(),
            sink,
        }
    }

    fn request(&self) -> Result<Request, TransportError> {
        let mut request = self
            .events_url
            .as_str()
            .into_client_request()
            .map_err(|error| TransportError::InvalidEndpoint(error.to_string()))?;

        if !self.token.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|error| TransportError::InvalidEndpoint(error.to_string()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        Ok(request)
    }
}

impl ChannelConnector for WebSocketConnector {
    fn open(&self, session: u64, user_id: &UserId) -> Result<ChannelHandle, TransportError> {
        let request = self.request()?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let signals = SessionSignals {
            session,
            sink: Arc::clone(&self.sink),
        };
        self.runtime
            .spawn(run_channel(request, outbound_rx, stop_rx, signals));

        tracing::info!(
            code = CHANNEL_TASK_STARTED,
            session,
            user_id = %user_id,
            "live channel task started"
        );

        Ok(ChannelHandle::new(outbound_tx, stop_tx))
    }
}

struct SessionSignals {
    session: u64,
    sink: Arc<dyn SignalSink>,
}

impl SessionSignals {
    fn emit(&self, signal: ChannelSignal) -> bool {
        let sent = self.sink.deliver(self.session, signal);

        if !sent {
            tracing::warn!(
                code = CHANNEL_SIGNAL_SEND_FAILED,
                session = self.session,
                "main loop is gone; stopping live channel task"
            );
        }
        sent
    }
}

async fn run_channel(
    request: Request,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundEvent>,
    mut stop_rx: watch::Receiver<bool>,
    signals: SessionSignals,
) {
    let stream = tokio::select! {
        _ = stop_rx.changed() => {
            tracing::info!(
                code = CHANNEL_TASK_STOPPED,
                session = signals.session,
                "live channel released before handshake completed"
            );
            return;
        }
        connected = connect_async(request) => match connected {
            Ok((stream, _response)) => stream,
            Err(error) => {
                tracing::warn!(
                    code = CHANNEL_HANDSHAKE_FAILED,
                    session = signals.session,
                    error = %error,
                    "live channel handshake failed"
                );
                signals.emit(ChannelSignal::Closed {
                    reason: Some(error.to_string()),
                });
                return;
            }
        }
    };

    if !signals.emit(ChannelSignal::Opened) {
        return;
    }

    let (mut writer, mut reader) = stream.split();

    let reason = loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                let stopped = changed.is_err() || *stop_rx.borrow();
                if stopped {
                    let _ = writer.send(WsMessage::Close(None)).await;
                    tracing::info!(
                        code = CHANNEL_TASK_STOPPED,
                        session = signals.session,
                        "live channel task stopped"
                    );
                    return;
                }
            }
            outbound = outbound_rx.recv() => {
                let Some(event) = outbound else {
                    let _ = writer.close().await;
                    return;
                };

                match encode_outbound(&event) {
                    Ok(text) => {
                        if let Err(error) = writer.send(WsMessage::Text(text.into())).await {
                            break Some(error.to_string());
                        }
                    }
                    Err(error) => {
                        tracing::warn!(
                            code = CHANNEL_ENCODE_FAILED,
                            event = event.name(),
                            error = %error,
                            "dropping outbound event that failed to encode"
                        );
                    }
                }
            }
            inbound = reader.next() => match inbound {
                Some(Ok(WsMessage::Text(text))) => {
                    if !signals.emit(ChannelSignal::Frame(text.as_str().to_owned())) {
                        return;
                    }
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    break frame.map(|frame| frame.reason.as_str().to_owned());
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => break Some(error.to_string()),
                None => break None,
            }
        }
    };

    signals.emit(ChannelSignal::Closed { reason });
}
