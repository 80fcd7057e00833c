use super::error::{AttemptFailure, FailedAttempt, TierFailure};
use super::models::{ModelId, ModelTier, TierKind};
use super::request::build_request;
use crate::config::{Config, ConfigError};
use crate::util::truncate_str;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Maximum length of a provider error body kept for diagnostics
const MAX_ERROR_BODY_LEN: usize = 200;

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    /// Content can be null in some API responses (e.g., refusals)
    #[serde(default)]
    content: Option<String>,
}

/// Raw text returned by the first model in a tier that answered with 200.
///
/// The content has not been validated as JSON yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSuccess {
    pub model: ModelId,
    pub content: String,
}

/// Client for the single chat-completions endpoint shared by every model.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    referer: String,
    title: String,
    request_timeout: Duration,
}

impl ProviderClient {
    /// Fails with [`ConfigError::MissingCredential`] before any request is made.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config.api_key()?.to_string();
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key,
            referer: config.referer.clone(),
            title: config.title.clone(),
            request_timeout: config.request_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Issue one request for `model` and classify the outcome.
    ///
    /// The timeout covers sending the request and reading the whole body.
    pub async fn attempt(&self, model: &ModelId, prompt: &str) -> Result<String, AttemptFailure> {
        let request = build_request(model, prompt);

        let exchange = async {
            let response = self
                .http
                .post(&self.endpoint)
                .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
                .header(CONTENT_TYPE, "application/json")
                .header("HTTP-Referer", &self.referer)
                .header("X-Title", &self.title)
                .json(&request)
                .send()
                .await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        match timeout(self.request_timeout, exchange).await {
            Err(_) => Err(AttemptFailure::Timeout),
            Ok(Err(err)) if err.is_timeout() => Err(AttemptFailure::Timeout),
            Ok(Err(err)) => Err(AttemptFailure::Transport {
                message: err.to_string(),
            }),
            Ok(Ok((status, text))) if status == StatusCode::OK => first_choice_content(&text),
            Ok(Ok((status, text))) => Err(AttemptFailure::HttpError {
                status: status.as_u16(),
                body_prefix: truncate_str(&text, MAX_ERROR_BODY_LEN).to_string(),
            }),
        }
    }

    /// Try each model of `models` in order, stopping at the first success.
    ///
    /// Failures are logged and recorded; nothing is retried. If every model
    /// fails, the returned [`TierFailure::Exhausted`] lists them in attempt order.
    pub async fn run_tier(
        &self,
        tier: TierKind,
        models: &ModelTier,
        prompt: &str,
    ) -> Result<AttemptSuccess, TierFailure> {
        let mut attempts = Vec::with_capacity(models.len());

        for model in models.iter() {
            let started = Instant::now();
            debug!(tier = %tier, model = %model, "attempting model");

            match self.attempt(model, prompt).await {
                Ok(content) => {
                    info!(
                        tier = %tier,
                        model = %model,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "model attempt succeeded"
                    );
                    return Ok(AttemptSuccess {
                        model: model.clone(),
                        content,
                    });
                }
                Err(reason) => {
                    log_failure(tier, model, &reason, started);
                    attempts.push(FailedAttempt {
                        model: model.clone(),
                        reason,
                    });
                }
            }
        }

        warn!(tier = %tier, models = %models, "all models in tier failed");
        Err(TierFailure::Exhausted { tier, attempts })
    }
}

fn log_failure(tier: TierKind, model: &ModelId, reason: &AttemptFailure, started: Instant) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match reason {
        AttemptFailure::HttpError {
            status,
            body_prefix,
        } => warn!(
            tier = %tier,
            model = %model,
            status = *status,
            body = %body_prefix,
            elapsed_ms,
            "model attempt failed: provider error"
        ),
        AttemptFailure::Timeout => warn!(
            tier = %tier,
            model = %model,
            elapsed_ms,
            "model attempt failed: timeout"
        ),
        AttemptFailure::Transport { message } => warn!(
            tier = %tier,
            model = %model,
            error = %message,
            elapsed_ms,
            "model attempt failed: transport error"
        ),
    }
}

/// Pull `choices[0].message.content` out of a 200 response body.
///
/// A body without that field is a failed attempt, not a success.
fn first_choice_content(body: &str) -> Result<String, AttemptFailure> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| AttemptFailure::Transport {
            message: format!(
                "invalid response body: {} ({})",
                e,
                truncate_str(body, MAX_ERROR_BODY_LEN)
            ),
        })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AttemptFailure::Transport {
            message: "response contained no message content".to_string(),
        })
}
