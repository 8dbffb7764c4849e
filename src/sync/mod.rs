//! Live channel layer: transport session, wire codec, and inbound fan-out.

pub mod codec;
pub mod notification_router;
pub mod transport;
pub mod websocket;

/// Returns the sync module name for smoke checks.
pub fn module_name() -> &'static str {
    "sync"
}
