//! Domain layer: core entities and business rules.

pub mod compose;
pub mod conversation;
pub mod conversation_store;
pub mod events;
pub mod ids;
pub mod message;
pub mod message_thread;
pub mod presence;
pub mod shell_state;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
