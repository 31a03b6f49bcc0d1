//! Relay configuration
//!
//! Read from environment variables (seeded from `.env` by `main`). Parsing
//! goes through a lookup closure so tests never touch the process
//! environment.

use crate::llm::{
    all_models, Backend, CompletionProvider, InferenceService, LoggingProvider, ProviderError,
    RankedProvider, Tradeoff,
};
use crate::relay::SamplingParams;
use crate::state_machine::RetryPolicy;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BACKEND_URL: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";
const DEFAULT_PORT: u16 = 9000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Which provider implementation backs the relay
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderChoice {
    /// One fixed model
    Single { model: String },
    /// Best catalog model under a tradeoff
    Ranked {
        candidates: Vec<String>,
        exclude: HashSet<Backend>,
        tradeoff: Tradeoff,
    },
}

/// Configuration for the relay server
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub backend_url: String,
    pub api_token: String,
    pub port: u16,
    pub cold_start_wait: Duration,
    pub max_cold_start_wait: Duration,
    pub request_timeout: Duration,
    pub provider: ProviderChoice,
    pub sampling: SamplingParams,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_token = get("RELAY_API_TOKEN").ok_or(ConfigError::Missing("RELAY_API_TOKEN"))?;

        let provider = match get("RELAY_PROVIDER").as_deref().map(str::trim) {
            None | Some("single") => ProviderChoice::Single {
                model: get("RELAY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            },
            Some("ranked") => ProviderChoice::Ranked {
                candidates: get("RELAY_CANDIDATES").map_or_else(
                    || all_models().iter().map(|m| m.id.to_string()).collect(),
                    |v| split_list(&v),
                ),
                exclude: get("RELAY_EXCLUDE_PROVIDERS")
                    .map(|v| {
                        split_list(&v)
                            .iter()
                            .map(|name| name.parse::<Backend>())
                            .collect::<Result<HashSet<_>, _>>()
                    })
                    .transpose()
                    .map_err(|message| ConfigError::Invalid {
                        key: "RELAY_EXCLUDE_PROVIDERS",
                        message,
                    })?
                    .unwrap_or_default(),
                tradeoff: parse_or("RELAY_TRADEOFF", get("RELAY_TRADEOFF"), Tradeoff::Cost)?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "RELAY_PROVIDER",
                    message: format!("expected single or ranked, got {other}"),
                })
            }
        };

        let defaults = SamplingParams::default();
        Ok(Self {
            backend_url: get("RELAY_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            api_token,
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            cold_start_wait: Duration::from_secs(parse_or(
                "RELAY_COLD_START_WAIT_SECS",
                get("RELAY_COLD_START_WAIT_SECS"),
                30,
            )?),
            max_cold_start_wait: Duration::from_secs(parse_or(
                "RELAY_MAX_COLD_START_WAIT_SECS",
                get("RELAY_MAX_COLD_START_WAIT_SECS"),
                300,
            )?),
            request_timeout: Duration::from_secs(parse_or(
                "RELAY_REQUEST_TIMEOUT_SECS",
                get("RELAY_REQUEST_TIMEOUT_SECS"),
                120,
            )?),
            provider,
            sampling: SamplingParams {
                temperature: parse_or(
                    "RELAY_TEMPERATURE",
                    get("RELAY_TEMPERATURE"),
                    defaults.temperature,
                )?,
                top_p: parse_or("RELAY_TOP_P", get("RELAY_TOP_P"), defaults.top_p)?,
                repetition_penalty: parse_or(
                    "RELAY_REPETITION_PENALTY",
                    get("RELAY_REPETITION_PENALTY"),
                    defaults.repetition_penalty,
                )?,
            },
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            default_wait: self.cold_start_wait,
            max_wait: self.max_cold_start_wait,
        }
    }

    /// Construct the configured provider, wrapped for logging
    pub fn build_provider(&self) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
        // The HTTP client timeout sits above the relay's own per-attempt
        // timeout so the relay reports it consistently.
        let http_timeout = self.request_timeout + Duration::from_secs(5);

        match &self.provider {
            ProviderChoice::Single { model } => {
                let service = InferenceService::new(
                    &self.backend_url,
                    model,
                    self.api_token.clone(),
                    http_timeout,
                )?;
                Ok(Arc::new(LoggingProvider::new(Arc::new(service))))
            }
            ProviderChoice::Ranked {
                candidates,
                exclude,
                tradeoff,
            } => {
                let excluded: Vec<&str> = exclude.iter().map(|b| b.name()).collect();
                tracing::info!(?tradeoff, excluded = ?excluded, "Building ranked provider");
                let ranked = RankedProvider::from_catalog(
                    candidates,
                    &self.backend_url,
                    &self.api_token,
                    http_timeout,
                    exclude,
                    *tradeoff,
                )?;
                Ok(Arc::new(ranked))
            }
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}
