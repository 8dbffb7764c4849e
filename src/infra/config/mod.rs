mod app_config;
mod file_config;
mod loader;

pub use app_config::{AppConfig, ChatConfig, LogConfig, ServerConfig, SessionConfig};
pub use loader::load;
