use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use toolchat_agent::AgentError;
use toolchat_provider::Provider;

use crate::dto::{ChatRequest, ChatResponse, ErrorDetail};
use crate::state::GatewayState;

/// Runs exactly one agent turn per request
pub async fn chat_handler<P: Provider + 'static>(
    State(state): State<Arc<GatewayState<P>>>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let message = payload.message;
    if message.trim().is_empty() {
        warn!("Rejecting /chat request due to empty message");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorDetail {
                detail: "message cannot be empty".to_string(),
            }),
        )
            .into_response();
    }

    info!(length = message.len(), "Received /chat request");

    // Dropping this future (client went away) cancels the turn.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match state.agent().run_turn(&message, &cancel).await {
        Ok(turn) => {
            info!(rounds = turn.round_count(), "Chat request completed");
            let answer = turn.into_final_answer().unwrap_or_default();
            (StatusCode::OK, Json(ChatResponse::success(answer))).into_response()
        }
        Err(err) => {
            error!(%err, "Agent turn failed");
            let status = status_for(&err);
            (status, Json(ChatResponse::error(err.user_message()))).into_response()
        }
    }
}

fn status_for(err: &AgentError) -> StatusCode {
    match err {
        AgentError::ReasoningEngine(_) => StatusCode::BAD_GATEWAY,
        AgentError::RoundLimitExceeded { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AgentError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}
