use serde::Deserialize;

use crate::infra::config::{AppConfig, ChatConfig, LogConfig, ServerConfig, SessionConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub server: Option<FileServerConfig>,
    pub session: Option<FileSessionConfig>,
    pub chat: Option<FileChatConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(server) = self.server {
            server.merge_into(&mut config.server);
        }

        if let Some(session) = self.session {
            session.merge_into(&mut config.session);
        }

        if let Some(chat) = self.chat {
            chat.merge_into(&mut config.chat);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileServerConfig {
    pub api_base_url: Option<String>,
    pub events_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

impl FileServerConfig {
    fn merge_into(self, config: &mut ServerConfig) {
        if let Some(api_base_url) = self.api_base_url {
            config.api_base_url = api_base_url;
        }

        if let Some(events_url) = self.events_url {
            config.events_url = events_url;
        }

        if let Some(timeout_ms) = self.request_timeout_ms {
            config.request_timeout_ms = timeout_ms;
        }
    }
}

#[derive(Deserialize, Default)]
pub struct FileSessionConfig {
    pub user_id: Option<String>,
    pub token: Option<String>,
}

impl FileSessionConfig {
    fn merge_into(self, config: &mut SessionConfig) {
        if let Some(user_id) = self.user_id {
            config.user_id = user_id;
        }

        if let Some(token) = self.token {
            config.token = token;
        }
    }
}

impl std::fmt::Debug for FileSessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSessionConfig")
            .field("user_id", &self.user_id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileChatConfig {
    pub typing_quiet_window_ms: Option<u64>,
    pub typing_emit_interval_ms: Option<u64>,
    pub max_message_chars: Option<usize>,
}

impl FileChatConfig {
    fn merge_into(self, config: &mut ChatConfig) {
        if let Some(window_ms) = self.typing_quiet_window_ms {
            config.typing_quiet_window_ms = window_ms;
        }

        if let Some(interval_ms) = self.typing_emit_interval_ms {
            config.typing_emit_interval_ms = interval_ms;
        }

        if let Some(max_chars) = self.max_message_chars.filter(|max| *max > 0) {
            config.max_message_chars = max_chars;
        }
    }
}
