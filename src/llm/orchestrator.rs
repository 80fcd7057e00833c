//! Two-tier model orchestration.
//!
//! `complete` moves through TryingPrimary -> TryingFallback, ending in either a
//! parsed object or a failure that carries one cause per tier. The fallback
//! tier is only reached once the primary tier is exhausted or its answer could
//! not be parsed.

use super::client::ProviderClient;
use super::error::{OrchestrationError, TierFailure};
use super::extract::{extract_object, StructuredObject};
use super::models::{ModelTier, TierKind};
use crate::config::Config;
use tracing::warn;

/// Runs prompts against the primary tier, escalating to the fallback tier.
///
/// Holds no mutable state; share it behind an `Arc` across concurrent callers.
#[derive(Clone)]
pub struct Orchestrator {
    client: ProviderClient,
    primary: ModelTier,
    fallback: ModelTier,
}

impl Orchestrator {
    /// Build from config. A missing API key fails here, before any request.
    pub fn new(config: &Config) -> Result<Self, OrchestrationError> {
        let client = ProviderClient::new(config)?;
        Ok(Self::with_client(
            client,
            config.primary.clone(),
            config.fallback.clone(),
        ))
    }

    pub fn with_client(client: ProviderClient, primary: ModelTier, fallback: ModelTier) -> Self {
        Self {
            client,
            primary,
            fallback,
        }
    }

    pub fn primary(&self) -> &ModelTier {
        &self.primary
    }

    pub fn fallback(&self) -> &ModelTier {
        &self.fallback
    }

    /// Get a structured JSON object for `prompt`.
    ///
    /// `preferred` is tried first within the primary tier only; the fallback
    /// tier is always attempted in full.
    pub async fn complete(
        &self,
        prompt: &str,
        preferred: Option<&str>,
    ) -> Result<StructuredObject, OrchestrationError> {
        if prompt.trim().is_empty() {
            return Err(OrchestrationError::EmptyPrompt);
        }

        let primary_models = self.primary.with_preferred(preferred);
        let primary = match self.try_tier(TierKind::Primary, &primary_models, prompt).await {
            Ok(object) => return Ok(object),
            Err(failure) => failure,
        };
        warn!(error = %primary, "primary chain failed, trying fallback models");

        let fallback = match self.try_tier(TierKind::Fallback, &self.fallback, prompt).await {
            Ok(object) => return Ok(object),
            Err(failure) => failure,
        };
        warn!(error = %fallback, "fallback chain failed");

        Err(OrchestrationError::Exhausted { primary, fallback })
    }

    /// Run one tier and extract its answer. A malformed answer fails the tier;
    /// the same content is never re-parsed or re-requested.
    async fn try_tier(
        &self,
        tier: TierKind,
        models: &ModelTier,
        prompt: &str,
    ) -> Result<StructuredObject, TierFailure> {
        let success = self.client.run_tier(tier, models, prompt).await?;
        extract_object(&success.content).map_err(|error| {
            warn!(
                tier = %tier,
                model = %success.model,
                error = %error.parse_error,
                "model answered with malformed output"
            );
            TierFailure::Malformed {
                tier,
                model: success.model,
                error,
            }
        })
    }
}
