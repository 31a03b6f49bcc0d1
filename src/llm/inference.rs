//! Hosted inference endpoint provider
//!
//! Talks to a text-generation endpoint that takes
//! `{"inputs": ..., "parameters": {...}}` and answers with
//! `[{"generated_text": ...}]`. A 503 means the model is still being loaded.

use super::types::{wait_from_secs, GenerationOutcome, GenerationRequest};
use super::{CompletionProvider, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status the backend uses to signal a cold start
const COLD_START_STATUS: u16 = 503;

/// Single-model inference endpoint
pub struct InferenceService {
    client: Client,
    api_token: String,
    url: String,
    model_id: String,
}

impl InferenceService {
    /// `base_url` is the models root; the model id is appended as a path.
    pub fn new(
        base_url: &str,
        model: &str,
        api_token: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        if model.trim().is_empty() {
            return Err(ProviderError::config("model id must not be empty"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_token,
            url: format!("{}/{}", base_url.trim_end_matches('/'), model.trim()),
            model_id: model.trim().to_string(),
        })
    }

    fn translate_request(request: &GenerationRequest) -> InferenceRequest<'_> {
        InferenceRequest {
            inputs: &request.prompt,
            parameters: InferenceParameters {
                max_new_tokens: request.max_new_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
                repetition_penalty: request.repetition_penalty,
                return_full_text: false,
            },
        }
    }

    /// Map an HTTP answer onto a generation outcome
    fn classify_response(status: u16, body: &str) -> GenerationOutcome {
        if status == COLD_START_STATUS {
            let estimate = serde_json::from_str::<InferenceErrorBody>(body)
                .ok()
                .and_then(|b| b.estimated_time)
                .map(wait_from_secs);
            return GenerationOutcome::Retryable(estimate);
        }

        if !(200..300).contains(&status) {
            return GenerationOutcome::Failed(ProviderError::status(status, body));
        }

        match serde_json::from_str::<InferenceResponse>(body) {
            Ok(InferenceResponse::Batch(items)) => match items.into_iter().next() {
                Some(item) => GenerationOutcome::Ready(item.generated_text),
                None => GenerationOutcome::Failed(ProviderError::unexpected_response(
                    "empty generation list",
                )),
            },
            Ok(InferenceResponse::Single(item)) => GenerationOutcome::Ready(item.generated_text),
            Err(e) => GenerationOutcome::Failed(ProviderError::unexpected_response(format!(
                "Failed to parse response: {e} - body: {body}"
            ))),
        }
    }
}

#[async_trait]
impl CompletionProvider for InferenceService {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let payload = Self::translate_request(request);

        let response = match self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                let err = if e.is_timeout() {
                    ProviderError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    ProviderError::network(format!("Connection failed: {e}"))
                } else {
                    ProviderError::network(format!("Request failed: {e}"))
                };
                return GenerationOutcome::Failed(err);
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return GenerationOutcome::Failed(ProviderError::network(format!(
                    "Failed to read response: {e}"
                )))
            }
        };

        Self::classify_response(status, &body)
    }

    fn provider_id(&self) -> &str {
        &self.model_id
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    repetition_penalty: f32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct InferenceErrorBody {
    #[allow(dead_code)]
    error: Option<String>,
    estimated_time: Option<f64>,
}
