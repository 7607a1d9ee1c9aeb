//! HTTP surface: the Green API webhook receiver and a health probe
//!
//! The webhook handler only normalizes and enqueues; all real work happens
//! behind the aggregator so the gateway gets its 200 back immediately and
//! never retries a slow turn.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;
use vitrina_channels::WebhookNotification;
use vitrina_core::MessageAggregator;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Debounce buffer in front of the orchestrator
    pub aggregator: Arc<MessageAggregator>,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn webhook(
    State(state): State<AppState>,
    Json(notification): Json<WebhookNotification>,
) -> StatusCode {
    let Some(message) = notification.into_incoming() else {
        debug!("skipping non-text or non-incoming notification");
        return StatusCode::OK;
    };
    state
        .aggregator
        .submit(&message.chat_id, &message.sender_name, &message.text)
        .await;
    StatusCode::OK
}
