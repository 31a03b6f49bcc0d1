//! Provider error types

use std::time::Duration;
use thiserror::Error;

/// Provider error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// Upstream HTTP status, when the backend answered at all
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Non-success HTTP answer; status and body are kept verbatim
    pub fn status(status: u16, body: impl AsRef<str>) -> Self {
        Self {
            kind: ProviderErrorKind::Status,
            message: format!("backend returned {status}: {}", body.as_ref()),
            status: Some(status),
        }
    }

    pub fn unexpected_response(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::UnexpectedResponse, detail)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ProviderErrorKind::Timeout,
            format!("backend did not answer within {}s", after.as_secs()),
        )
    }

    /// Still cold after the single retry
    pub fn still_loading() -> Self {
        Self::new(
            ProviderErrorKind::Unavailable,
            "model is still loading after retry, please try again later",
        )
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Config, message)
    }

    /// Message shown to the caller. Shape errors are reported generically,
    /// the detail only goes to the log.
    pub fn user_message(&self) -> String {
        match self.kind {
            ProviderErrorKind::UnexpectedResponse => "unexpected response format".to_string(),
            _ => self.message.clone(),
        }
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Non-success HTTP status other than the cold-start signal
    Status,
    /// Backend answered 200 with a payload we cannot read
    UnexpectedResponse,
    /// Connection or transport failure
    Network,
    /// Attempt exceeded the request timeout
    Timeout,
    /// Backend reported cold start on the retry too
    Unavailable,
    /// Provider could not be built from configuration
    Config,
}
