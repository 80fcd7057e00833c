//! Failure taxonomy for model orchestration.
//!
//! Per-attempt failures are recorded and drive the next attempt; only a fully
//! exhausted fallback tier (or a configuration problem) reaches the caller.

use super::models::{ModelId, TierKind};
use crate::config::ConfigError;
use thiserror::Error;

/// Why a single model attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("HTTP {status}: {body_prefix}")]
    HttpError { status: u16, body_prefix: String },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {message}")]
    Transport { message: String },
}

/// One failed attempt, kept for diagnostics in attempt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub model: ModelId,
    pub reason: AttemptFailure,
}

/// A 200 response whose content could not be turned into a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse JSON response: {parse_error}\nRaw content (first 500 chars): {text_prefix}")]
pub struct MalformedResponse {
    pub parse_error: String,
    pub text_prefix: String,
}

/// Why a whole tier produced no structured result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierFailure {
    #[error("all {tier} models failed: {}", format_attempts(.attempts))]
    Exhausted {
        tier: TierKind,
        attempts: Vec<FailedAttempt>,
    },

    #[error("{tier} model {model} answered with malformed output: {error}")]
    Malformed {
        tier: TierKind,
        model: ModelId,
        error: MalformedResponse,
    },
}

impl TierFailure {
    pub fn tier(&self) -> TierKind {
        match self {
            TierFailure::Exhausted { tier, .. } | TierFailure::Malformed { tier, .. } => *tier,
        }
    }

    /// Reason of the last attempt in an exhausted tier.
    pub fn last_reason(&self) -> Option<&AttemptFailure> {
        match self {
            TierFailure::Exhausted { attempts, .. } => attempts.last().map(|a| &a.reason),
            TierFailure::Malformed { .. } => None,
        }
    }

    /// Models attempted, in order.
    pub fn attempted_models(&self) -> Vec<&ModelId> {
        match self {
            TierFailure::Exhausted { attempts, .. } => attempts.iter().map(|a| &a.model).collect(),
            TierFailure::Malformed { model, .. } => vec![model],
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, TierFailure::Malformed { .. })
    }
}

fn format_attempts(attempts: &[FailedAttempt]) -> String {
    if attempts.is_empty() {
        return "no models configured".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.model, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Caller-visible failure of an orchestration call.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// No attempt was made.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("prompt is empty")]
    EmptyPrompt,

    /// Both tiers failed. Each cause is kept separately.
    #[error("All models failed.\n  Primary error : {primary}\n  Fallback error: {fallback}")]
    Exhausted {
        primary: TierFailure,
        fallback: TierFailure,
    },
}
