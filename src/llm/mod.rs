pub mod client;
pub mod error;
pub mod extract;
pub mod models;
pub mod orchestrator;
pub mod request;

pub use client::{AttemptSuccess, ProviderClient};
pub use error::{AttemptFailure, FailedAttempt, MalformedResponse, OrchestrationError, TierFailure};
pub use extract::{extract_object, StructuredObject};
pub use models::{ModelId, ModelTier, TierKind};
pub use orchestrator::Orchestrator;
pub use request::{build_request, ChatRequest};
