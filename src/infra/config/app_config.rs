use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::domain::compose::DEFAULT_MAX_MESSAGE_CHARS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Base of the REST API, e.g. `https://market.example.com/api`.
    pub api_base_url: String,
    /// WebSocket endpoint of the live channel.
    pub events_url: String,
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_owned(),
            events_url: "ws://localhost:5000/events".to_owned(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Identity of the signed-in user. Empty values mean "not signed in".
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub user_id: String,
    pub token: String,
}

impl SessionConfig {
    pub fn is_complete(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.token.trim().is_empty()
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token.is_empty() {
            "<empty>"
        } else {
            "<redacted>"
        };
        f.debug_struct("SessionConfig")
            .field("user_id", &self.user_id)
            .field("token", &token)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatConfig {
    pub typing_quiet_window_ms: u64,
    pub typing_emit_interval_ms: u64,
    pub max_message_chars: usize,
}

impl ChatConfig {
    pub fn typing_quiet_window(&self) -> Duration {
        Duration::from_millis(self.typing_quiet_window_ms)
    }

    pub fn typing_emit_interval(&self) -> Duration {
        Duration::from_millis(self.typing_emit_interval_ms)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_quiet_window_ms: 3_000,
            typing_emit_interval_ms: 1_000,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }
}
