//! The interaction dispatcher.
//!
//! Slack delivers every interactive callback (button clicks, modal
//! submissions) to one endpoint as a form-encoded POST whose `payload` field
//! holds a JSON envelope, and expects a well-formed response within about
//! three seconds. Anything slower, or any 5xx, makes Slack surface a timeout
//! to the user and retry the delivery - and retries against a handler with
//! side effects mean duplicate dialogs and duplicate notifications. So every
//! failure path here terminates in a 2xx or 4xx with a body the platform
//! understands, and faults are reported to the acting user rather than
//! propagated.

use axum::{
    extract::{Form, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::blocks::{self, Block};
use crate::envelope::{self, ButtonClick, DecodeError, Envelope, ModalSubmit};
use crate::slack::SlackApi as _;
use crate::store::{StoreError, TaskStore as _};
use crate::task::TaskStatus;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Maximum request body size (1MB). Interaction payloads are small; this
/// bound prevents memory exhaustion via oversized bodies.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Maximum age of a request timestamp, in seconds. Requests outside this
/// window are rejected to prevent replay of captured requests. The tolerance
/// also applies to future timestamps to handle clock skew.
const TIMESTAMP_TOLERANCE_SECONDS: i64 = 300;

fn is_timestamp_within_tolerance(timestamp_secs: i64, now_secs: i64) -> bool {
    (now_secs - timestamp_secs).abs() <= TIMESTAMP_TOLERANCE_SECONDS
}

/// Verify a Slack request signature using constant-time comparison.
///
/// Slack signs `v0:{timestamp}:{body}` with HMAC-SHA256 under the app's
/// signing secret and sends the result as `v0=<hex>` in the
/// `x-slack-signature` header.
fn verify_slack_signature(secret: &str, timestamp: &str, body: &[u8], signature: &str) -> bool {
    let Some(signature_hex) = signature.strip_prefix("v0=") else {
        return false;
    };

    let signature_bytes = match hex::decode(signature_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };

    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);

    mac.verify_slice(&signature_bytes).is_ok()
}

/// Middleware verifying the Slack request signature before the dispatcher
/// sees the payload.
async fn verify_interaction_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_SIZE).await.map_err(|_| {
        error!("Interaction body too large or read error");
        StatusCode::PAYLOAD_TOO_LARGE
    })?;

    let timestamp = parts
        .headers
        .get("x-slack-request-timestamp")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            error!("Missing x-slack-request-timestamp header");
            StatusCode::UNAUTHORIZED
        })?;

    let timestamp_secs: i64 = timestamp.parse().map_err(|_| {
        error!("Invalid x-slack-request-timestamp format: {}", timestamp);
        StatusCode::UNAUTHORIZED
    })?;

    let now_secs = chrono::Utc::now().timestamp();
    if !is_timestamp_within_tolerance(timestamp_secs, now_secs) {
        error!(
            "Request timestamp {} outside tolerance (current: {}, tolerance: {}s)",
            timestamp_secs, now_secs, TIMESTAMP_TOLERANCE_SECONDS
        );
        return Err(StatusCode::UNAUTHORIZED);
    }

    let signature = parts
        .headers
        .get("x-slack-signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            error!("Missing x-slack-signature header");
            StatusCode::UNAUTHORIZED
        })?;

    if !verify_slack_signature(&state.signing_secret, timestamp, &bytes, signature) {
        error!("Invalid Slack request signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let new_request = Request::from_parts(parts, axum::body::Body::from(bytes));
    Ok(next.run(new_request).await)
}

/// The form body Slack sends to the interaction endpoint.
#[derive(Debug, Deserialize)]
pub struct InteractionForm {
    pub payload: Option<String>,
}

// ---------------------------------------------------------------------------
// Response shapes required by the interaction protocol.
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

#[derive(Serialize)]
struct Ack {
    status: &'static str,
}

#[derive(Serialize)]
struct EphemeralMessage {
    response_type: &'static str,
    text: String,
}

#[derive(Serialize)]
struct MessageRewrite {
    replace_original: bool,
    blocks: Vec<Block>,
}

#[derive(Serialize)]
struct ClearDialog {
    response_action: &'static str,
}

#[derive(Serialize)]
struct ValidationErrors {
    response_action: &'static str,
    errors: CommentBlockErrors,
}

#[derive(Serialize)]
struct CommentBlockErrors {
    comment_block: String,
}

fn client_error(message: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
}

fn ignored() -> Response {
    Json(Ack { status: "ignored" }).into_response()
}

/// A reply visible only to the acting user.
fn ephemeral(text: impl Into<String>) -> Response {
    Json(EphemeralMessage {
        response_type: "ephemeral",
        text: text.into(),
    })
    .into_response()
}

/// Instruct Slack to replace the original channel message.
fn replace_message(blocks: Vec<Block>) -> Response {
    Json(MessageRewrite {
        replace_original: true,
        blocks,
    })
    .into_response()
}

fn clear_dialog() -> Response {
    Json(ClearDialog {
        response_action: "clear",
    })
    .into_response()
}

/// Field-level error rendered inline in the still-open dialog.
fn comment_validation_error(message: impl Into<String>) -> Response {
    Json(ValidationErrors {
        response_action: "errors",
        errors: CommentBlockErrors {
            comment_block: message.into(),
        },
    })
    .into_response()
}

/// Entry point for all interactive callbacks.
pub async fn slack_actions_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<InteractionForm>,
) -> Response {
    let Some(payload) = form.payload else {
        warn!("Interaction request had no payload field");
        return client_error("missing payload");
    };

    match envelope::decode(&payload) {
        Ok(Envelope::ButtonClick(click)) => handle_button_click(&state, click).await,
        Ok(Envelope::ModalSubmit(submit)) => handle_modal_submission(&state, submit).await,
        Ok(Envelope::Unknown { kind }) => {
            info!("Ignoring interaction of kind {:?}", kind);
            ignored()
        }
        Err(DecodeError::InvalidJson(e)) => {
            warn!("Interaction payload was not valid JSON: {}", e);
            client_error("invalid payload")
        }
        Err(DecodeError::MalformedEnvelope { kind, source }) => {
            // A recognized kind with an interior we could not decode. Report
            // to the user instead of 500ing: a 5xx here makes Slack retry the
            // whole delivery. Submissions get a field-keyed error so the
            // dialog stays open.
            error!("Malformed {} envelope: {}", kind, source);
            if kind == envelope::VIEW_SUBMISSION {
                comment_validation_error("Something went wrong saving your comment")
            } else {
                ephemeral("Something went wrong handling that interaction")
            }
        }
    }
}

async fn handle_button_click(state: &AppState, click: ButtonClick) -> Response {
    // The envelope may list several simultaneous actions; the protocol
    // convention is that only the first is authoritative.
    let Some(action) = click.actions.first() else {
        warn!("block_actions envelope carried no actions");
        return ephemeral("Something went wrong handling that interaction");
    };

    let user = &click.user.username;
    info!(
        "User {} clicked {} for task {}",
        user, action.action_id, action.value
    );

    let task = match state.store.find(&action.value).await {
        Ok(task) => task,
        Err(StoreError::NotFound(id)) => {
            info!("Task {} not found", id);
            return ephemeral("Task not found!");
        }
    };

    match action.action_id.as_str() {
        blocks::ACCEPT_ACTION => {
            // Accept is idempotent: the write and the rendered summary are
            // the same whether the task was new or already accepted, so a
            // re-delivered click produces an identical outcome.
            let mut task = task;
            task.status = TaskStatus::Accepted;

            if let Err(e) = state.store.save(task.clone()).await {
                error!("Failed to persist accepted task {}: {}", task.id, e);
                return ephemeral("Could not accept the task, please try again");
            }

            info!("Task {} accepted by {}", task.id, user);
            replace_message(blocks::accepted_summary(&task, user))
        }
        blocks::COMMENT_ACTION => {
            // Opening a dialog is two-phase: the dialog goes out via a
            // separate views.open call, and the inline response stays empty.
            let Some(trigger_id) = click.trigger_id.as_deref() else {
                warn!("No trigger_id in payload - cannot open dialog");
                return ephemeral("Could not open the comment dialog (no trigger id)");
            };

            let view = blocks::comment_modal(&task);
            match state.slack.open_view(trigger_id, &view).await {
                Ok(()) => {
                    info!("Comment dialog opened for task {}", task.id);
                    StatusCode::OK.into_response()
                }
                Err(e) => {
                    // Reported, never retried: if the open actually succeeded
                    // and only the response was lost, a retry would open the
                    // dialog a second time.
                    error!("Failed to open comment dialog for task {}: {}", task.id, e);
                    ephemeral(format!("Error opening the comment dialog: {e}"))
                }
            }
        }
        other => {
            info!("Unknown action: {}", other);
            ignored()
        }
    }
}

async fn handle_modal_submission(state: &AppState, submit: ModalSubmit) -> Response {
    let task_id = submit.view.private_metadata.task_id();
    let text = submit
        .view
        .state
        .values
        .comment_block
        .comment_input
        .value
        .unwrap_or_default();
    let user = &submit.user.username;

    info!("Saving comment from {} for task {}", user, task_id);

    let mut task = match state.store.find(&task_id).await {
        Ok(task) => task,
        Err(StoreError::NotFound(id)) => {
            // The one failure that must not dismiss the dialog: render it
            // inline against the input block instead.
            info!("Task {} not found for comment submission", id);
            return comment_validation_error("Task not found");
        }
    };

    // Wholesale overwrite: each submission replaces the previous comment.
    task.comment = Some(format!("Comment by @{user}:\n{text}"));

    match state.store.save(task).await {
        Ok(()) => {
            info!("Comment saved for task {}", task_id);
            clear_dialog()
        }
        Err(e) => {
            error!("Failed to save comment for task {}: {}", task_id, e);
            comment_validation_error("Could not save the comment, please try again")
        }
    }
}

pub fn actions_router(middleware_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/slack/actions", post(slack_actions_handler))
        .route_layer(middleware::from_fn_with_state(
            middleware_state,
            verify_interaction_signature,
        ))
}
