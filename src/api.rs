//! HTTP and WebSocket surface of the relay

mod handlers;
mod session;
mod types;

pub use handlers::create_router;

use crate::relay::SessionRelay;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<SessionRelay>,
}

impl AppState {
    pub fn new(relay: SessionRelay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}
