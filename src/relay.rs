//! Session relay
//!
//! Turns one inbound conversation message into exactly one reply: sizes the
//! request, renders the prompt, runs the cold-start retry protocol against
//! the provider and sanitizes what comes back.

mod error;
pub mod prompt;
pub mod sanitize;
pub mod sizing;

pub use error::RelayError;
pub use prompt::PromptTemplate;
#[allow(unused_imports)] // Public API re-exports
pub use sanitize::{EchoStripper, Sanitizer, FALLBACK_REPLY};
pub use sizing::{SamplingParams, TokenBudget};

use crate::llm::{
    CompletionProvider, GenerationOutcome, GenerationRequest, ProviderError, Role, Turn,
};
use crate::state_machine::{start, transition, Effect, Event, RelayState, RetryPolicy};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Outbound message to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Sanitized completion
    Content(String),
    /// Informational message (cold-start wait)
    Notice(String),
    Error(String),
}

impl Reply {
    /// Wire form. Errors carry an `Error: ` prefix so callers can tell
    /// them apart from content.
    pub fn into_text(self) -> String {
        match self {
            Reply::Content(text) | Reply::Notice(text) => text,
            Reply::Error(message) => format!("Error: {message}"),
        }
    }
}

/// Whether the reply reached the outbound channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Connection went away; nothing more will be written
    Abandoned,
}

/// Generation relay shared by every session.
///
/// Holds no per-message state; everything mutable lives on the stack of
/// `handle_message`.
pub struct SessionRelay {
    provider: Arc<dyn CompletionProvider>,
    sanitizer: Arc<dyn Sanitizer>,
    template: PromptTemplate,
    budget: TokenBudget,
    sampling: SamplingParams,
    policy: RetryPolicy,
    request_timeout: Duration,
}

impl SessionRelay {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        let template = PromptTemplate::default();
        Self {
            provider,
            sanitizer: Arc::new(EchoStripper::new(&template)),
            template,
            budget: TokenBudget::default(),
            sampling: SamplingParams::default(),
            policy: RetryPolicy::default(),
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Replace the template. The default sanitizer is rebuilt so it strips
    /// the same markers the prompt uses.
    #[allow(dead_code)] // Used in tests; production keeps the default persona
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.sanitizer = Arc::new(EchoStripper::new(&template));
        self.template = template;
        self
    }

    #[allow(dead_code)] // Used in tests; production keeps the echo stripper
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }

    /// Extract the text of the last user turn
    pub fn parse_user_message(raw: &str) -> Result<String, RelayError> {
        let turns: Vec<Turn> = serde_json::from_str(raw)
            .map_err(|e| RelayError::malformed(format!("expected a JSON list of turns ({e})")))?;

        let last_user = turns
            .into_iter()
            .rev()
            .find(|t| t.role == Role::User)
            .ok_or_else(|| RelayError::malformed("conversation has no user turn"))?;

        let message = last_user.content.trim();
        if message.is_empty() {
            return Err(RelayError::malformed("user message is empty"));
        }
        Ok(message.to_string())
    }

    /// Build the request for one trimmed user message
    pub fn build_request(&self, message: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: self.template.render(message),
            max_new_tokens: self.budget.max_new_tokens(message),
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            repetition_penalty: self.sampling.repetition_penalty,
        }
    }

    /// Process one inbound message and send its reply.
    ///
    /// Every failure is turned into a single error reply. Returns
    /// `Abandoned` once the connection is gone.
    pub async fn handle_message(
        &self,
        raw: &str,
        replies: &mpsc::Sender<Reply>,
        cancel: &CancellationToken,
    ) -> Delivery {
        let reply = match self.respond(raw, replies, cancel).await {
            Ok(Some(text)) => Reply::Content(text),
            Ok(None) => {
                tracing::info!("Connection closed, abandoning reply");
                return Delivery::Abandoned;
            }
            Err(e) => {
                match &e {
                    RelayError::MalformedInput(detail) => {
                        tracing::warn!(error = %detail, "Rejected inbound message");
                    }
                    RelayError::Provider(err) => {
                        tracing::error!(
                            error = %err.message,
                            kind = ?err.kind,
                            status = ?err.status,
                            "Generation failed"
                        );
                    }
                    RelayError::Protocol(err) => {
                        tracing::error!(error = %err, "Retry protocol error");
                    }
                }
                Reply::Error(e.to_string())
            }
        };

        Self::send(replies, cancel, reply).await
    }

    async fn respond(
        &self,
        raw: &str,
        replies: &mpsc::Sender<Reply>,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, RelayError> {
        let message = Self::parse_user_message(raw)?;
        let request = self.build_request(&message);
        tracing::debug!(
            words = sizing::word_count(&message),
            max_new_tokens = request.max_new_tokens,
            "Built generation request"
        );

        match self.run_protocol(&request, replies, cancel).await? {
            None => Ok(None),
            Some(RelayState::Succeeded { text }) => {
                Ok(Some(self.sanitizer.sanitize(&text, &request.prompt)))
            }
            Some(RelayState::Failed { error }) => Err(error.into()),
            Some(other) => Err(RelayError::Protocol(
                crate::state_machine::TransitionError::InvalidTransition(format!(
                    "protocol stopped in non-terminal state {}",
                    other.name()
                )),
            )),
        }
    }

    /// Drive the retry state machine until it reaches a terminal state.
    /// `None` means the connection closed first.
    async fn run_protocol(
        &self,
        request: &GenerationRequest,
        replies: &mpsc::Sender<Reply>,
        cancel: &CancellationToken,
    ) -> Result<Option<RelayState>, RelayError> {
        let initial = start();
        let mut state = initial.new_state;
        let mut pending: VecDeque<Effect> = initial.effects.into();

        while let Some(effect) = pending.pop_front() {
            let event = match effect {
                Effect::CallProvider { attempt } => {
                    tracing::debug!(attempt, "Calling provider");
                    tokio::select! {
                        biased;

                        () = cancel.cancelled() => return Ok(None),

                        outcome = self.attempt(request) => Event::ProviderOutcome(outcome),
                    }
                }

                Effect::Notify { message } => {
                    if Self::send(replies, cancel, Reply::Notice(message)).await
                        == Delivery::Abandoned
                    {
                        return Ok(None);
                    }
                    continue;
                }

                Effect::Sleep { duration } => {
                    tracing::info!(wait_secs = duration.as_secs(), "Waiting for cold start");
                    tokio::select! {
                        biased;

                        () = cancel.cancelled() => return Ok(None),

                        () = tokio::time::sleep(duration) => Event::WaitElapsed,
                    }
                }
            };

            let result = transition(&state, &self.policy, event)?;
            tracing::debug!(from = state.name(), to = result.new_state.name(), "Relay transition");
            state = result.new_state;
            pending.extend(result.effects);
        }

        Ok(Some(state))
    }

    /// One provider call bounded by the request timeout
    async fn attempt(&self, request: &GenerationRequest) -> GenerationOutcome {
        match tokio::time::timeout(self.request_timeout, self.provider.generate(request)).await {
            Ok(outcome) => outcome,
            Err(_) => GenerationOutcome::Failed(ProviderError::timeout(self.request_timeout)),
        }
    }

    async fn send(
        replies: &mpsc::Sender<Reply>,
        cancel: &CancellationToken,
        reply: Reply,
    ) -> Delivery {
        if cancel.is_cancelled() {
            return Delivery::Abandoned;
        }
        match replies.send(reply).await {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Abandoned,
        }
    }
}
