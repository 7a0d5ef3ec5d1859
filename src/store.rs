//! Task store adapter.
//!
//! The dispatcher depends only on the `TaskStore` trait: resolve a task by
//! id, persist one whole record per call. Durable backends would implement
//! the same trait; the in-memory store here is the reference implementation
//! and the test substrate.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::task::{Task, TaskId, TaskStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(TaskId),
}

/// Fields supplied by the creation path; everything else is assigned by the
/// store.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

/// Narrow interface over task records.
///
/// `save` has upsert semantics and persists `status` and `comment` in the
/// same call; the dispatcher relies on that to make accept/comment a single
/// write.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find(&self, id: &TaskId) -> Result<Task, StoreError>;

    async fn save(&self, task: Task) -> Result<(), StoreError>;

    async fn create(&self, new: NewTask) -> Result<Task, StoreError>;
}

/// In-memory task store. All state is lost on restart.
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn find(&self, id: &TaskId) -> Result<Task, StoreError> {
        let tasks = self.tasks.read().await;
        tasks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn save(&self, task: Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn create(&self, new: NewTask) -> Result<Task, StoreError> {
        let task = Task {
            id: TaskId(Uuid::new_v4().to_string()),
            title: new.title,
            description: new.description,
            status: TaskStatus::New,
            comment: None,
            created_at: Utc::now(),
        };
        let mut tasks = self.tasks.write().await;
        tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }
}
