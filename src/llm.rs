//! Completion provider abstraction
//!
//! The relay only sees [`CompletionProvider`]; which backend (or set of
//! backends) answers is decided when the provider is constructed.

mod error;
mod inference;
mod models;
mod ranked;
mod types;

#[cfg(test)]
pub mod testing;

pub use error::{ProviderError, ProviderErrorKind};
pub use inference::InferenceService;
#[allow(unused_imports)] // Public API re-exports
pub use models::{all_models, find_model, Backend, ModelDef};
pub use ranked::{RankedProvider, Tradeoff};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for text-generation backends.
///
/// Implementations are shared by every session, so `generate` must not
/// mutate shared configuration.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one generation attempt
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome;

    /// Identifier used in logs and the health endpoint
    fn provider_id(&self) -> &str;
}

#[async_trait]
impl<T: CompletionProvider + ?Sized> CompletionProvider for Arc<T> {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        (**self).generate(request).await
    }

    fn provider_id(&self) -> &str {
        (**self).provider_id()
    }
}

/// Logging wrapper for providers
pub struct LoggingProvider {
    inner: Arc<dyn CompletionProvider>,
    provider_id: String,
}

impl LoggingProvider {
    pub fn new(inner: Arc<dyn CompletionProvider>) -> Self {
        let provider_id = inner.provider_id().to_string();
        Self { inner, provider_id }
    }
}

#[async_trait]
impl CompletionProvider for LoggingProvider {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let start = std::time::Instant::now();
        let outcome = self.inner.generate(request).await;
        let duration = start.elapsed();

        match &outcome {
            GenerationOutcome::Ready(text) => {
                tracing::info!(
                    provider = %self.provider_id,
                    duration_ms = %duration.as_millis(),
                    max_new_tokens = request.max_new_tokens,
                    output_chars = text.chars().count(),
                    "Generation completed"
                );
            }
            GenerationOutcome::Retryable(wait) => {
                tracing::warn!(
                    provider = %self.provider_id,
                    duration_ms = %duration.as_millis(),
                    estimated_wait_secs = ?wait.map(|w| w.as_secs_f64()),
                    "Backend is loading the model"
                );
            }
            GenerationOutcome::Failed(e) => {
                tracing::error!(
                    provider = %self.provider_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    status = ?e.status,
                    "Generation failed"
                );
            }
        }

        outcome
    }

    fn provider_id(&self) -> &str {
        &self.provider_id
    }
}
