//! Per-message error types

use crate::llm::ProviderError;
use crate::state_machine::TransitionError;
use thiserror::Error;

/// Anything that turns one inbound message into an error reply.
///
/// None of these end the session.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Not a JSON turn list, no user turn, or empty content
    #[error("malformed message: {0}")]
    MalformedInput(String),

    /// Backend failure; shape errors render generically
    #[error("{}", .0.user_message())]
    Provider(#[from] ProviderError),

    #[error("internal error: {0}")]
    Protocol(#[from] TransitionError),
}

impl RelayError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedInput(detail.into())
    }
}
