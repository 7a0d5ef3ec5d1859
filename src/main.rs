use anyhow::Result;
use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

use taskrelay::admin::create_task_handler;
use taskrelay::config::Config;
use taskrelay::webhook::actions_router;
use taskrelay::{AppState, InMemoryTaskStore, SlackClient};

async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "taskrelay"
    })))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting task relay");

    let config =
        Config::from_env().expect("Failed to load configuration from environment variables");

    let slack_client = SlackClient::new(
        config.slack_bot_token.clone(),
        config.slack_webhook_url.clone(),
    );

    let app_state = Arc::new(AppState {
        store: Arc::new(InMemoryTaskStore::new()),
        slack: Arc::new(slack_client),
        signing_secret: config.slack_signing_secret.clone(),
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/tasks", post(create_task_handler))
        .merge(actions_router(app_state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // Backstop for the never-crash-the-handler contract: a panic
                // anywhere in a handler still yields a response instead of a
                // dropped connection, which Slack would treat as a timeout
                // and retry.
                .layer(CatchPanicLayer::new()),
        )
        .with_state(app_state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
