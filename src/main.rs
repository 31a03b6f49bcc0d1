//! turn-relay - conversation relay for hosted text-generation backends
//!
//! Accepts a conversation over a WebSocket, forwards the latest user turn
//! to the configured completion provider and answers with one sanitized
//! completion per inbound message.

mod api;
mod config;
mod llm;
mod relay;
mod state_machine;

use api::{create_router, AppState};
use config::RelayConfig;
use llm::CompletionProvider;
use relay::SessionRelay;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real environment variables win anyway
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turn_relay=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let provider = config.build_provider()?;
    tracing::info!(
        provider = %provider.provider_id(),
        backend = %config.backend_url,
        cold_start_wait_secs = config.cold_start_wait.as_secs(),
        max_cold_start_wait_secs = config.max_cold_start_wait.as_secs(),
        request_timeout_secs = config.request_timeout.as_secs(),
        "Completion provider initialized"
    );

    let relay = SessionRelay::new(provider)
        .with_sampling(config.sampling)
        .with_retry_policy(config.retry_policy())
        .with_request_timeout(config.request_timeout);

    let app = create_router(AppState::new(relay)).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("turn-relay listening on ws://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
