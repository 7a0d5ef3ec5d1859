pub mod admin;
pub mod blocks;
pub mod config;
pub mod envelope;
pub mod slack;
pub mod store;
pub mod task;
pub mod webhook;

use std::sync::Arc;

pub use slack::{SlackApi, SlackClient, SlackError};
pub use store::{InMemoryTaskStore, NewTask, StoreError, TaskStore};
pub use task::{CorrelationToken, Task, TaskId, TaskStatus};

/// Shared application state.
///
/// The dispatcher holds no per-request state of its own; everything durable
/// lives behind the store, and the outbound surface sits behind `SlackApi`
/// so tests can substitute a recording double.
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub slack: Arc<dyn SlackApi>,
    pub signing_secret: String,
}
