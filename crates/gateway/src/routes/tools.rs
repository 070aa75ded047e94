use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::debug;

use toolchat_provider::Provider;

use crate::dto::ToolListResponse;
use crate::state::GatewayState;

pub async fn tools_handler<P: Provider + 'static>(
    State(state): State<Arc<GatewayState<P>>>,
) -> Json<ToolListResponse> {
    let tools = state.agent().registry().specs();
    debug!(tool_count = tools.len(), "Serving /tools request");
    Json(ToolListResponse { tools })
}
