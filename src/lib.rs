//! CodeRefine library crate
//!
//! Submits source code to hosted LLMs for review or rewriting and recovers a
//! structured JSON result from whatever the models send back. Models are tried
//! one at a time across a primary and a fallback tier.

pub mod config;
pub mod history;
pub mod llm;
pub mod logging;
pub mod prompts;
pub mod review;
pub mod util;

pub use config::{Config, ConfigError};
pub use history::{HistoryEntry, HistoryStore};
pub use llm::{OrchestrationError, Orchestrator, StructuredObject};
pub use review::{AnalyzeRequest, ReviewError, Reviewer, RewriteRequest};
