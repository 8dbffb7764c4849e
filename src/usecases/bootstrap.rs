use std::path::Path;

use crate::{
    domain::ids::UserId,
    infra::{self, config::SessionConfig, error::AppError, storage_layout::StorageLayout},
    usecases::context::AppContext,
};

/// Loads configuration and prepares the on-disk layout. Logging is set up by
/// the caller because the TUI and one-shot commands log to different sinks.
pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config = infra::config::load(config_path)?;
    let layout = StorageLayout::resolve()?;
    layout.ensure_dirs()?;

    Ok(AppContext::new(config, layout))
}

/// The authenticated identity from `[session]`, or an error when it is
/// missing.
pub fn session_identity(session: &SessionConfig) -> Result<UserId, AppError> {
    if !session.is_complete() {
        return Err(AppError::SessionMissing);
    }

    Ok(UserId::new(session.user_id.trim()))
}
