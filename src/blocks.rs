//! Block Kit surfaces: the announcement message, the accepted summary, and
//! the comment modal.
//!
//! These are our own serde types rather than raw `json!` maps so that the
//! dialog's `private_metadata` stays a typed [`CorrelationToken`] and the
//! action/block ids live in one place.

use serde::Serialize;

use crate::task::{CorrelationToken, Task};

/// Action id on the accept button.
pub const ACCEPT_ACTION: &str = "accept_task";
/// Action id on the comment button.
pub const COMMENT_ACTION: &str = "comment_task";
/// Block id of the comment input in the modal.
pub const COMMENT_BLOCK: &str = "comment_block";
/// Action id of the text input inside the comment block.
pub const COMMENT_INPUT: &str = "comment_input";
/// Callback id identifying the comment modal.
pub const COMMENT_MODAL_CALLBACK: &str = "comment_modal";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
    #[serde(rename = "plain_text")]
    Plain { text: String },
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Element {
    #[serde(rename = "button")]
    Button {
        text: TextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<String>,
        value: String,
        action_id: String,
    },
    #[serde(rename = "plain_text_input")]
    PlainTextInput {
        action_id: String,
        multiline: bool,
        placeholder: TextObject,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "section")]
    Section { text: TextObject },
    #[serde(rename = "divider")]
    Divider,
    #[serde(rename = "actions")]
    Actions { elements: Vec<Element> },
    #[serde(rename = "input")]
    Input {
        block_id: String,
        element: Element,
        label: TextObject,
    },
}

/// Dialog descriptor sent to `views.open`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalView {
    #[serde(rename = "type")]
    kind: &'static str,
    callback_id: String,
    title: TextObject,
    submit: TextObject,
    close: TextObject,
    blocks: Vec<Block>,
    private_metadata: CorrelationToken,
}

/// Channel message announcing a newly created task, with its two buttons.
pub fn announcement(task: &Task) -> Vec<Block> {
    vec![
        Block::Section {
            text: TextObject::mrkdwn(format!(
                "*New Task Created*\n\n*Title:* {}\n*Description:* {}",
                task.title,
                task.description_or_placeholder()
            )),
        },
        Block::Divider,
        Block::Actions {
            elements: vec![
                Element::Button {
                    text: TextObject::plain("Accept"),
                    style: Some("primary".to_string()),
                    value: task.id.0.clone(),
                    action_id: ACCEPT_ACTION.to_string(),
                },
                Element::Button {
                    text: TextObject::plain("Comment"),
                    style: None,
                    value: task.id.0.clone(),
                    action_id: COMMENT_ACTION.to_string(),
                },
            ],
        },
    ]
}

/// Replacement for the announcement once a task has been accepted.
///
/// Rendering depends only on the task record and the acting user, never on
/// the task's prior status, so re-delivered accept clicks produce an
/// identical message.
pub fn accepted_summary(task: &Task, accepted_by: &str) -> Vec<Block> {
    vec![Block::Section {
        text: TextObject::mrkdwn(format!(
            "*Task Accepted!*\n\n*Title:* {}\n*Description:* {}\n*Accepted by:* @{}",
            task.title,
            task.description_or_placeholder(),
            accepted_by
        )),
    }]
}

/// The comment dialog, with the task id tucked into `private_metadata` so the
/// submission can be correlated back without any secondary lookup.
pub fn comment_modal(task: &Task) -> ModalView {
    ModalView {
        kind: "modal",
        callback_id: COMMENT_MODAL_CALLBACK.to_string(),
        title: TextObject::plain("Add Comment"),
        submit: TextObject::plain("Save Comment"),
        close: TextObject::plain("Cancel"),
        blocks: vec![
            Block::Section {
                text: TextObject::mrkdwn(format!("*Task:* {}", task.title)),
            },
            Block::Input {
                block_id: COMMENT_BLOCK.to_string(),
                element: Element::PlainTextInput {
                    action_id: COMMENT_INPUT.to_string(),
                    multiline: true,
                    placeholder: TextObject::plain("Enter your comment here..."),
                },
                label: TextObject::plain("Comment"),
            },
        ],
        private_metadata: CorrelationToken::for_task(&task.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskId, TaskStatus};
    use chrono::Utc;

    fn sample_task() -> Task {
        Task {
            id: TaskId::from("42"),
            title: "Ship report".to_string(),
            description: Some("Q3 numbers".to_string()),
            status: TaskStatus::New,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn announcement_carries_both_buttons_with_task_id() {
        let blocks = announcement(&sample_task());
        let json = serde_json::to_value(&blocks).unwrap();

        assert_eq!(json[0]["type"], "section");
        assert_eq!(json[1]["type"], "divider");

        let elements = json[2]["elements"].as_array().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0]["action_id"], ACCEPT_ACTION);
        assert_eq!(elements[0]["value"], "42");
        assert_eq!(elements[0]["style"], "primary");
        assert_eq!(elements[1]["action_id"], COMMENT_ACTION);
        assert_eq!(elements[1]["value"], "42");
    }

    #[test]
    fn accepted_summary_mentions_title_description_and_user() {
        let blocks = accepted_summary(&sample_task(), "ana");
        let json = serde_json::to_value(&blocks).unwrap();

        let text = json[0]["text"]["text"].as_str().unwrap();
        assert!(text.contains("Ship report"));
        assert!(text.contains("Q3 numbers"));
        assert!(text.contains("@ana"));
    }

    #[test]
    fn accepted_summary_uses_placeholder_for_missing_description() {
        let mut task = sample_task();
        task.description = None;

        let blocks = accepted_summary(&task, "ana");
        let json = serde_json::to_value(&blocks).unwrap();
        let text = json[0]["text"]["text"].as_str().unwrap();
        assert!(text.contains("No description"));
    }

    #[test]
    fn comment_modal_embeds_correlation_token_and_input_path() {
        let view = comment_modal(&sample_task());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["type"], "modal");
        assert_eq!(json["callback_id"], COMMENT_MODAL_CALLBACK);
        assert_eq!(json["private_metadata"], "42");

        // The submission handler reads state.values.comment_block.comment_input,
        // so the modal must declare exactly those ids.
        assert_eq!(json["blocks"][1]["block_id"], COMMENT_BLOCK);
        assert_eq!(json["blocks"][1]["element"]["action_id"], COMMENT_INPUT);
        assert_eq!(json["blocks"][1]["element"]["multiline"], true);
    }
}
