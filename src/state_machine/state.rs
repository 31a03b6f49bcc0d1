//! Retry protocol state types

use crate::llm::ProviderError;
use std::time::Duration;

/// Per-message protocol state
#[derive(Debug)]
pub enum RelayState {
    /// Provider call in flight. `attempt` is 1 for the first call, 2 for
    /// the single retry.
    Attempting { attempt: u32 },

    /// Backend reported a cold start; suspended until `wait` elapses
    WaitingForColdStart { wait: Duration },

    /// Raw completion, not yet sanitized
    Succeeded { text: String },

    Failed { error: ProviderError },
}

impl RelayState {
    #[allow(dead_code)] // Used by tests
    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayState::Succeeded { .. } | RelayState::Failed { .. })
    }

    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            RelayState::Attempting { .. } => "attempting",
            RelayState::WaitingForColdStart { .. } => "waiting_for_cold_start",
            RelayState::Succeeded { .. } => "succeeded",
            RelayState::Failed { .. } => "failed",
        }
    }
}

/// Wait settings for the cold-start path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Used when the backend does not estimate a wait
    pub default_wait: Duration,
    /// Upper bound applied to backend estimates
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            default_wait: Duration::from_secs(30),
            max_wait: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Time to suspend before the retry: the (capped) estimate rounded up
    /// to whole seconds, plus one second of slack.
    pub fn cold_start_wait(&self, estimate: Option<Duration>) -> Duration {
        let estimate = estimate.unwrap_or(self.default_wait).min(self.max_wait);
        let whole_secs = estimate.as_secs() + u64::from(estimate.subsec_nanos() > 0);
        Duration::from_secs(whole_secs.saturating_add(1))
    }
}
