//! Use case layer: application workflows and orchestration.

pub mod bootstrap;
pub mod context;
pub mod contracts;
pub mod list_conversations;
pub mod load_messages;
pub mod mark_read;
pub mod message_store;
pub mod send_message;
pub mod session;
pub mod shell;
pub mod store_dispatcher;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
