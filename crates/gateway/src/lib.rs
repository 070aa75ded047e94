//! Chat gateway
//!
//! Thin axum front end: `POST /chat` runs one agent turn per request,
//! `GET /tools` lists the registered tools and `GET /` reports liveness.

mod dto;
mod error;
mod routes;
mod state;

pub use dto::{ChatRequest, ChatResponse, ErrorDetail, StatusMessage, ToolListResponse};
pub use error::GatewayError;
pub use state::GatewayState;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use toolchat_agent::AgentLoop;
use toolchat_config::GatewayConfig;
use toolchat_provider::Provider;

/// Build the application router
pub fn router<P: Provider + 'static>(agent: Arc<AgentLoop<P>>, config: &GatewayConfig) -> Router {
    let state = Arc::new(GatewayState::new(agent));

    Router::new()
        .route("/", get(routes::health::root_handler))
        .route("/chat", post(routes::chat::chat_handler::<P>))
        .route("/tools", get(routes::tools::tools_handler::<P>))
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve<P: Provider + 'static>(
    agent: Arc<AgentLoop<P>>,
    config: &GatewayConfig,
) -> Result<(), GatewayError> {
    let bind = format!("{}:{}", config.host, config.port);
    let addr: SocketAddr = bind
        .parse()
        .map_err(|_| GatewayError::Address(bind.clone()))?;

    info!(%addr, "Binding chat gateway");
    let app = router(agent, config);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind { addr, source })?;
    info!(%addr, "Chat gateway ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(GatewayError::Serve)?;

    info!("Chat gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
