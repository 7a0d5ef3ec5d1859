//! Outbound Slack surface.
//!
//! Two calls leave this process: `views.open` (dialog open, bearer token) and
//! the incoming-webhook post that announces a new task. Both run against a
//! client whose timeout is deliberately shorter than the 3-second response
//! deadline Slack imposes on the inbound interaction endpoint, so a slow
//! outbound call still leaves time to answer the original request. Neither
//! call is retried: a lost `views.open` response with a retry could open the
//! dialog twice.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::blocks::{Block, ModalView};
use crate::task::Task;

const VIEWS_OPEN_URL: &str = "https://slack.com/api/views.open";

/// Timeout for each outbound Slack call. Must stay below Slack's own
/// 3-second deadline on the interaction endpoint.
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, thiserror::Error)]
pub enum SlackError {
    /// Slack answered but reported failure (`ok: false`). The reason is
    /// user-reportable, e.g. `expired_trigger_id`.
    #[error("Slack API error: {0}")]
    Api(String),

    /// The call never produced a usable response: timeout, connection error,
    /// unparseable body.
    #[error("Slack request failed: {0}")]
    Transport(String),
}

/// The outbound operations the dispatcher and the creation path need.
///
/// A trait seam rather than the concrete client so tests can count calls and
/// capture the views we send.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Open a modal dialog via `views.open` using a click's trigger token.
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackError>;

    /// Post the announcement message for a newly created task.
    async fn announce_task(&self, task: &Task) -> Result<(), SlackError>;
}

pub struct SlackClient {
    client: Client,
    bot_token: String,
    webhook_url: String,
}

#[derive(Debug, Serialize)]
struct ViewsOpenRequest<'a> {
    trigger_id: &'a str,
    view: &'a ModalView,
}

#[derive(Debug, Deserialize)]
struct ViewsOpenResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnnouncementMessage {
    blocks: Vec<Block>,
}

impl SlackClient {
    pub fn new(bot_token: String, webhook_url: String) -> Self {
        let client = Client::builder()
            .timeout(OUTBOUND_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            bot_token,
            webhook_url,
        }
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackError> {
        let response = self
            .client
            .post(VIEWS_OPEN_URL)
            .bearer_auth(&self.bot_token)
            .json(&ViewsOpenRequest { trigger_id, view })
            .send()
            .await
            .map_err(|e| SlackError::Transport(e.to_string()))?;

        let body: ViewsOpenResponse = response
            .json()
            .await
            .map_err(|e| SlackError::Transport(e.to_string()))?;

        if body.ok {
            info!("Dialog opened");
            Ok(())
        } else {
            let reason = body.error.unwrap_or_else(|| "unknown error".to_string());
            error!("views.open rejected: {}", reason);
            Err(SlackError::Api(reason))
        }
    }

    async fn announce_task(&self, task: &Task) -> Result<(), SlackError> {
        let message = AnnouncementMessage {
            blocks: crate::blocks::announcement(task),
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| SlackError::Transport(e.to_string()))?;

        if response.status().is_success() {
            info!("Task announced: {}", task.title);
            Ok(())
        } else {
            let status = response.status();
            error!("Announcement webhook returned {}", status);
            Err(SlackError::Api(format!("webhook returned {status}")))
        }
    }
}
