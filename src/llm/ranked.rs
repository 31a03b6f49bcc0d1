//! Multi-model provider that routes to the best-ranked candidate

use super::models::{find_model, Backend, ModelDef};
use super::types::{GenerationOutcome, GenerationRequest};
use super::{CompletionProvider, InferenceService, LoggingProvider, ProviderError};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// What the chooser optimises for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tradeoff {
    /// Cheapest first, quality breaks ties
    #[default]
    Cost,
    /// Best quality first, cost breaks ties
    Quality,
}

impl FromStr for Tradeoff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cost" => Ok(Tradeoff::Cost),
            "quality" => Ok(Tradeoff::Quality),
            other => Err(format!("unknown tradeoff '{other}' (expected cost or quality)")),
        }
    }
}

impl Tradeoff {
    fn compare(self, a: &ModelDef, b: &ModelDef) -> Ordering {
        match self {
            Tradeoff::Cost => a
                .cost
                .total_cmp(&b.cost)
                .then_with(|| b.quality.total_cmp(&a.quality)),
            Tradeoff::Quality => b
                .quality
                .total_cmp(&a.quality)
                .then_with(|| a.cost.total_cmp(&b.cost)),
        }
    }
}

struct Candidate {
    def: &'static ModelDef,
    service: Arc<dyn CompletionProvider>,
}

/// Provider that picks among several models.
///
/// Candidates from excluded backends are dropped at construction; the rest
/// are ordered once by the tradeoff and the head of the list serves every
/// request.
pub struct RankedProvider {
    ranked: Vec<Candidate>,
    provider_id: String,
}

impl std::fmt::Debug for RankedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankedProvider")
            .field("ranking", &self.ranking())
            .finish()
    }
}

impl RankedProvider {
    pub fn new(
        candidates: Vec<(&'static ModelDef, Arc<dyn CompletionProvider>)>,
        exclude: &HashSet<Backend>,
        tradeoff: Tradeoff,
    ) -> Result<Self, ProviderError> {
        let mut ranked: Vec<Candidate> = candidates
            .into_iter()
            .filter(|(def, _)| !exclude.contains(&def.backend))
            .map(|(def, service)| Candidate { def, service })
            .collect();

        if ranked.is_empty() {
            return Err(ProviderError::config(
                "no eligible models left after applying provider exclusions",
            ));
        }

        ranked.sort_by(|a, b| tradeoff.compare(a.def, b.def));
        let provider_id = format!("ranked:{}", ranked[0].def.id);

        Ok(Self {
            ranked,
            provider_id,
        })
    }

    /// Build one inference service per catalog id
    pub fn from_catalog(
        model_ids: &[String],
        base_url: &str,
        api_token: &str,
        timeout: Duration,
        exclude: &HashSet<Backend>,
        tradeoff: Tradeoff,
    ) -> Result<Self, ProviderError> {
        let mut candidates = Vec::with_capacity(model_ids.len());
        for id in model_ids {
            let def = find_model(id)
                .ok_or_else(|| ProviderError::config(format!("unknown model in catalog: {id}")))?;
            let service: Arc<dyn CompletionProvider> = Arc::new(LoggingProvider::new(Arc::new(
                InferenceService::new(base_url, def.id, api_token.to_string(), timeout)?,
            )));
            candidates.push((def, service));
        }

        let provider = Self::new(candidates, exclude, tradeoff)?;
        for (rank, candidate) in provider.ranked.iter().enumerate() {
            tracing::info!(
                rank,
                model = candidate.def.id,
                description = candidate.def.description,
                cost = candidate.def.cost,
                quality = candidate.def.quality,
                "Ranked candidate"
            );
        }
        Ok(provider)
    }

    /// Model ids in ranked order
    pub fn ranking(&self) -> Vec<&'static str> {
        self.ranked.iter().map(|c| c.def.id).collect()
    }
}

#[async_trait]
impl CompletionProvider for RankedProvider {
    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let chosen = &self.ranked[0];
        tracing::debug!(
            model = chosen.def.id,
            backend = chosen.def.backend.display_name(),
            "Routing request"
        );
        chosen.service.generate(request).await
    }

    fn provider_id(&self) -> &str {
        &self.provider_id
    }
}
