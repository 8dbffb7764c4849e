use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read config file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config section [session] is incomplete: `user_id` and `token` are required")]
    SessionMissing,
    #[error("unable to resolve storage path: {details}")]
    StoragePathResolution { details: String },
    #[error("failed to create directory {path}: {source}")]
    StorageDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to initialize logging: {0}")]
    LoggingInit(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("invalid [server] api_base_url `{url}`: {details}")]
    InvalidApiUrl { url: String, details: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),
    #[error("failed to start async runtime: {0}")]
    RuntimeInit(#[source] std::io::Error),
}
