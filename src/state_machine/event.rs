//! Events that drive the retry protocol

use crate::llm::GenerationOutcome;

/// Events that trigger state transitions
#[derive(Debug)]
pub enum Event {
    /// A provider call finished (or was turned into a failure locally,
    /// e.g. by the request timeout)
    ProviderOutcome(GenerationOutcome),

    /// The cold-start wait has elapsed
    WaitElapsed,
}
