//! Effects produced by state transitions

use std::time::Duration;

/// Effects to be executed by the relay after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue the generation request
    CallProvider { attempt: u32 },

    /// Send an informational message to the caller
    Notify { message: String },

    /// Suspend without blocking other sessions, then feed `WaitElapsed`
    Sleep { duration: Duration },
}

impl Effect {
    pub fn cold_start_notice(wait: Duration) -> Self {
        Effect::Notify {
            message: format!(
                "The model is loading, retrying in {} seconds...",
                wait.as_secs()
            ),
        }
    }
}
