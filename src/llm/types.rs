//! Common types for generation requests

use super::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Role of a turn in an inbound conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Assistant,
    System,
}

/// One message in an inbound conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Turns without a role are treated as user turns
    #[serde(default)]
    pub role: Role,
    pub content: String,
}

/// Request handed to a completion provider.
///
/// Built fresh for every inbound message and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

/// Result of a single provider call
#[derive(Debug)]
pub enum GenerationOutcome {
    /// Raw generated text, not yet sanitized
    Ready(String),
    /// Backend is still loading the model; retry after the estimated wait
    /// (`None` when the backend did not advertise one)
    Retryable(Option<Duration>),
    /// Terminal failure for this attempt
    Failed(ProviderError),
}

/// Build a wait duration from a backend-provided estimate in seconds.
///
/// Negative or non-finite estimates collapse to zero.
pub fn wait_from_secs(estimate: f64) -> Duration {
    if estimate.is_finite() && estimate > 0.0 {
        Duration::try_from_secs_f64(estimate).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}
