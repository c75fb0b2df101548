use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{error, info};

use crate::{
    chat::actions::{ChatRequest, ChatResponse, SummaryRequest, SummaryResponse},
    utils::truncate_for_log,
    AppState,
};

// --- Handlers ---

/// Server-side chat action: forward the user's input to the model with tools.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    if req.account_id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "accountId is required".to_string()));
    }
    if req.input.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "input is required".to_string()));
    }
    info!(
        account = %req.account_id,
        input = %truncate_for_log(&req.input, 80),
        "Handling chat request"
    );

    state
        .actions
        .handle_chat(&req.account_id, &req.input, req.current_transaction.as_ref())
        .await
        .map(Json)
        .map_err(|e| {
            error!("Chat action failed: {}", e);
            (StatusCode::BAD_GATEWAY, format!("Chat action failed: {}", e))
        })
}

/// Server-side summary action.
pub async fn summary_handler(
    State(state): State<AppState>,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, (StatusCode, String)> {
    match state.actions.summarize_tool_result(&req.tool_result).await {
        Ok(text) => Ok(Json(SummaryResponse { text })),
        Err(e) => {
            error!("Summary action failed: {}", e);
            Err((StatusCode::BAD_GATEWAY, format!("Summary action failed: {}", e)))
        }
    }
}

pub fn create_chat_router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/summary", post(summary_handler))
}
