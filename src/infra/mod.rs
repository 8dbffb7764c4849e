//! Infrastructure layer: config, storage, logging, and the REST adapter.

pub mod config;
pub mod error;
pub mod http_store;
pub mod logging;
pub mod storage_layout;
pub mod wire;

/// Returns the infra module name for smoke checks.
pub fn module_name() -> &'static str {
    "infra"
}
