//! Pure state transition function
//!
//! Attempting -> Succeeded | WaitingForColdStart | Failed
//! WaitingForColdStart -> Attempting (once) -> Succeeded | Failed

use super::{Effect, Event, RelayState, RetryPolicy};
use crate::llm::{GenerationOutcome, ProviderError};
use thiserror::Error;

/// Initial call plus one retry after a cold start
pub const MAX_ATTEMPTS: u32 = 2;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: RelayState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: RelayState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Exchange already finished in state {0}")]
    AlreadyFinished(&'static str),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Entry point for a new inbound message
pub fn start() -> TransitionResult {
    TransitionResult::new(RelayState::Attempting { attempt: 1 })
        .with_effect(Effect::CallProvider { attempt: 1 })
}

/// Pure transition function
pub fn transition(
    state: &RelayState,
    policy: &RetryPolicy,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (RelayState::Attempting { .. }, Event::ProviderOutcome(GenerationOutcome::Ready(text))) => {
            Ok(TransitionResult::new(RelayState::Succeeded { text }))
        }

        // Cold start with a retry left -> tell the caller, then wait
        (
            RelayState::Attempting { attempt },
            Event::ProviderOutcome(GenerationOutcome::Retryable(estimate)),
        ) if *attempt < MAX_ATTEMPTS => {
            let wait = policy.cold_start_wait(estimate);
            Ok(
                TransitionResult::new(RelayState::WaitingForColdStart { wait })
                    .with_effect(Effect::cold_start_notice(wait))
                    .with_effect(Effect::Sleep { duration: wait }),
            )
        }

        // Still cold on the retry -> give up
        (
            RelayState::Attempting { .. },
            Event::ProviderOutcome(GenerationOutcome::Retryable(_)),
        ) => Ok(TransitionResult::new(RelayState::Failed {
            error: ProviderError::still_loading(),
        })),

        (
            RelayState::Attempting { .. },
            Event::ProviderOutcome(GenerationOutcome::Failed(error)),
        ) => Ok(TransitionResult::new(RelayState::Failed { error })),

        (RelayState::WaitingForColdStart { .. }, Event::WaitElapsed) => {
            let attempt = MAX_ATTEMPTS;
            Ok(TransitionResult::new(RelayState::Attempting { attempt })
                .with_effect(Effect::CallProvider { attempt }))
        }

        (RelayState::Succeeded { .. } | RelayState::Failed { .. }, _) => {
            Err(TransitionError::AlreadyFinished(state.name()))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in state {}",
            state.name()
        ))),
    }
}
