//! Mock providers for testing
//!
//! These mocks let the relay and the session loop run without a backend.

use super::{CompletionProvider, GenerationOutcome, GenerationRequest, ProviderError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Mock provider that returns queued outcomes in order
pub struct MockProvider {
    outcomes: Mutex<VecDeque<GenerationOutcome>>,
    provider_id: String,
    delay: Option<Duration>,
    /// Record of all requests made
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl MockProvider {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            provider_id: provider_id.into(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue an outcome
    pub fn queue(&self, outcome: GenerationOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn queue_ready(&self, text: &str) {
        self.queue(GenerationOutcome::Ready(text.to_string()));
    }

    pub fn queue_cold_start(&self, secs: u64) {
        self.queue(GenerationOutcome::Retryable(Some(Duration::from_secs(secs))));
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn recorded_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                GenerationOutcome::Failed(ProviderError::network("No mock outcome queued"))
            })
    }

    fn provider_id(&self) -> &str {
        &self.provider_id
    }
}

/// Provider that answers by looking at the prompt, for multi-session tests.
///
/// Prompts containing `slow` report a cold start of `cold_secs` on their
/// first call and `slow answer` afterwards; everything else gets
/// `fast answer` immediately.
pub struct PromptKeyedProvider {
    cold_secs: u64,
    cold_served: Mutex<bool>,
}

impl PromptKeyedProvider {
    pub fn new(cold_secs: u64) -> Self {
        Self {
            cold_secs,
            cold_served: Mutex::new(false),
        }
    }
}

#[async_trait]
impl CompletionProvider for PromptKeyedProvider {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        if request.prompt.contains("slow") {
            let mut served = self.cold_served.lock().unwrap();
            if !*served {
                *served = true;
                return GenerationOutcome::Retryable(Some(Duration::from_secs(self.cold_secs)));
            }
            return GenerationOutcome::Ready("slow answer".to_string());
        }
        GenerationOutcome::Ready("fast answer".to_string())
    }

    fn provider_id(&self) -> &str {
        "prompt-keyed"
    }
}
