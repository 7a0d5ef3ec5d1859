//! Core task types shared across the store, the dispatcher, and rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable task identifier.
///
/// Treated as an uninterpreted string throughout: the dispatcher receives it
/// in button values and correlation tokens and hands it straight to the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Token embedded in a dialog's `private_metadata` at open time and returned
/// unchanged on submission.
///
/// This is the only sanctioned way to carry a task id through a dialog
/// round-trip; keeping it as its own type stops the id from being confused
/// with other opaque strings in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn for_task(id: &TaskId) -> Self {
        Self(id.0.clone())
    }

    pub fn task_id(&self) -> TaskId {
        TaskId(self.0.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    New,
    Accepted,
}

/// A tracked work item.
///
/// The dispatcher only ever mutates `status` and `comment`; everything else
/// is set at creation and read for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Display text for the description, matching the announcement rendering.
    pub fn description_or_placeholder(&self) -> &str {
        self.description.as_deref().unwrap_or("No description")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_round_trips_through_correlation_token() {
        let id = TaskId::from("42");
        let token = CorrelationToken::for_task(&id);
        assert_eq!(token.task_id(), id);
    }

    #[test]
    fn correlation_token_serializes_as_bare_string() {
        let token = CorrelationToken::for_task(&TaskId::from("task-7"));
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"task-7\"");

        let back: CorrelationToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Accepted).unwrap(),
            "\"accepted\""
        );
        assert_eq!(serde_json::to_string(&TaskStatus::New).unwrap(), "\"new\"");
    }
}
