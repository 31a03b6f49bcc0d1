//! HTTP request handlers

use super::session::handle_socket;
use super::types::HealthResponse;
use super::AppState;
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::get,
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Conversation socket
        .route("/", get(upgrade_socket))
        .route("/health", get(health))
        .route("/version", get(get_version))
        .with_state(state)
}

async fn upgrade_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.relay))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider: state.relay.provider_id().to_string(),
    })
}

async fn get_version() -> &'static str {
    concat!("turn-relay ", env!("CARGO_PKG_VERSION"))
}
