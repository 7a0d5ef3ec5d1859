//! Task creation endpoint.
//!
//! Deliberately thin: persist the task, announce it to the channel, return
//! the record. The announcement is best-effort; a Slack outage must not make
//! task creation fail.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::slack::SlackApi as _;
use crate::store::{NewTask, TaskStore as _};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
}

pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTaskRequest>,
) -> Response {
    if request.title.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "title must not be empty"})),
        )
            .into_response();
    }

    let task = match state
        .store
        .create(NewTask {
            title: request.title,
            description: request.description,
        })
        .await
    {
        Ok(task) => task,
        Err(e) => {
            error!("Failed to create task: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "could not create task"})),
            )
                .into_response();
        }
    };

    info!("Created task {} ({})", task.id, task.title);

    if let Err(e) = state.slack.announce_task(&task).await {
        error!("Failed to announce task {}: {}", task.id, e);
    }

    (StatusCode::CREATED, Json(task)).into_response()
}
