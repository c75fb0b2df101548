//! # API Module
//!
//! HTTP handlers for serve mode, which hosts the chat actions for remote
//! clients.
//!
//! ## Available Endpoints
//! - `GET /health` - Liveness check
//! - `POST /chat` - Chat action: `{accountId, input, currentTransaction}` -> `{text, toolResults}`
//! - `POST /summary` - Summary action: `{toolResult}` -> `{text}`

use axum::{response::IntoResponse, routing::get, Json, Router};

use crate::AppState;

pub mod chat;

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// All API routes, to be nested under `/api`.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .merge(chat::create_chat_router())
}
