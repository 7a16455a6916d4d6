pub mod branches;
pub mod shell;
pub mod tracks;

use anyhow::{Context, Result};
use attendance_api::ApiClient;
use attendance_core::Session;

use crate::config;

/// Start a session and build the backend client for it.
pub fn connect(cfg: &config::Config) -> Result<(Session, ApiClient)> {
    let session = Session::init(cfg.session_config()).with_context(|| {
        format!(
            "Set `token` in config.toml or the {} environment variable",
            config::TOKEN_ENV
        )
    })?;
    let client = ApiClient::new(&cfg.api_url, &session, cfg.timeout())
        .with_context(|| format!("Failed to set up client for {}", cfg.api_url))?;
    Ok((session, client))
}
