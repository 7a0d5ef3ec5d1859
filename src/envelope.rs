//! Decoding of the inbound interaction payload.
//!
//! Slack delivers one JSON document per callback; the `type` field says which
//! surface the user interacted with. We decode it once at the boundary into a
//! tagged union so handlers never probe raw maps for keys. Unknown types are
//! a normal outcome (the protocol grows event kinds we do not handle), so
//! they decode successfully to `Envelope::Unknown` rather than erroring.

use serde::Deserialize;
use serde_json::Value;

use crate::task::{CorrelationToken, TaskId};

pub const BLOCK_ACTIONS: &str = "block_actions";
pub const VIEW_SUBMISSION: &str = "view_submission";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload field was not valid JSON at all.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The `type` was recognized but the interior shape was not what that
    /// kind promises (e.g. `block_actions` without an `actions` array).
    #[error("malformed {kind} envelope: {source}")]
    MalformedEnvelope {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decoded callback event.
#[derive(Debug)]
pub enum Envelope {
    ButtonClick(ButtonClick),
    ModalSubmit(ModalSubmit),
    Unknown { kind: Option<String> },
}

#[derive(Debug, Deserialize)]
pub struct ButtonClick {
    pub actions: Vec<ActionEntry>,
    pub user: ActingUser,
    /// Single-use token for opening a dialog; only present on click events
    /// and only valid for a short window.
    pub trigger_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActionEntry {
    pub action_id: String,
    /// Button value carries the task id.
    pub value: TaskId,
}

#[derive(Debug, Deserialize)]
pub struct ActingUser {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ModalSubmit {
    pub view: SubmittedView,
    pub user: ActingUser,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedView {
    pub private_metadata: CorrelationToken,
    pub state: ViewState,
}

#[derive(Debug, Deserialize)]
pub struct ViewState {
    pub values: ViewValues,
}

#[derive(Debug, Deserialize)]
pub struct ViewValues {
    pub comment_block: CommentBlock,
}

#[derive(Debug, Deserialize)]
pub struct CommentBlock {
    pub comment_input: CommentInput,
}

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    /// Absent when the input was left empty.
    pub value: Option<String>,
}

/// Decode the raw `payload` form field into an [`Envelope`].
pub fn decode(payload: &str) -> Result<Envelope, DecodeError> {
    let value: Value = serde_json::from_str(payload).map_err(DecodeError::InvalidJson)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);

    match kind.as_deref() {
        Some(BLOCK_ACTIONS) => {
            let click: ButtonClick =
                serde_json::from_value(value).map_err(|source| DecodeError::MalformedEnvelope {
                    kind: BLOCK_ACTIONS.to_string(),
                    source,
                })?;
            Ok(Envelope::ButtonClick(click))
        }
        Some(VIEW_SUBMISSION) => {
            let submit: ModalSubmit =
                serde_json::from_value(value).map_err(|source| DecodeError::MalformedEnvelope {
                    kind: VIEW_SUBMISSION.to_string(),
                    source,
                })?;
            Ok(Envelope::ModalSubmit(submit))
        }
        _ => Ok(Envelope::Unknown { kind }),
    }
}
