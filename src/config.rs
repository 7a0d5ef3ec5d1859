use anyhow::{Context, Result};
use std::env;

#[derive(Clone)]
pub struct Config {
    /// Bot token used as the bearer credential for `views.open`.
    pub slack_bot_token: String,
    /// Signing secret used to verify inbound interaction requests.
    pub slack_signing_secret: String,
    /// Incoming-webhook URL that new-task announcements are posted to.
    pub slack_webhook_url: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let slack_bot_token = env::var("SLACK_BOT_TOKEN")
            .context("SLACK_BOT_TOKEN environment variable is required")?;

        let slack_signing_secret = require_non_blank(
            env::var("SLACK_SIGNING_SECRET")
                .context("SLACK_SIGNING_SECRET environment variable is required")?,
        )
        .context("SLACK_SIGNING_SECRET must not be blank")?;

        let slack_webhook_url = env::var("SLACK_WEBHOOK_URL")
            .context("SLACK_WEBHOOK_URL environment variable is required")?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid number")?;

        Ok(Config {
            slack_bot_token,
            slack_signing_secret,
            slack_webhook_url,
            port,
        })
    }
}

/// Reject empty or whitespace-only values.
///
/// An empty signing secret would make every forged request verify, so it is
/// treated the same as an unset one.
fn require_non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
