//! Code review and rewrite on top of the model orchestrator.
//!
//! Validates caller input, builds the prompt, fills in fields the model left
//! out, and records analyses in the session history.

use crate::history::{HistoryEntry, HistoryStore, NewEntry};
use crate::llm::{OrchestrationError, Orchestrator, StructuredObject};
use crate::prompts::{review_prompt, rewrite_prompt, Issue};
use crate::util::truncate_with_ellipsis;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Largest accepted input, in characters
pub const MAX_CODE_CHARS: usize = 50_000;

/// Characters of source kept in a history entry
const SNIPPET_CHARS: usize = 200;

pub const SUPPORTED_LANGUAGES: [&str; 17] = [
    "python",
    "javascript",
    "typescript",
    "java",
    "c",
    "cpp",
    "csharp",
    "go",
    "rust",
    "php",
    "ruby",
    "swift",
    "kotlin",
    "sql",
    "bash",
    "html",
    "css",
];

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("AI service unavailable: {0}")]
    Orchestration(#[from] OrchestrationError),
}

#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub code: String,
    pub language: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RewriteRequest {
    pub code: String,
    pub language: String,
    pub issues: Vec<Issue>,
    pub model: Option<String>,
}

/// Result of [`Reviewer::analyze`].
#[derive(Debug, Clone)]
pub struct Analysis {
    pub session_id: String,
    pub report: StructuredObject,
    pub history_entry: HistoryEntry,
}

pub struct Reviewer {
    orchestrator: Orchestrator,
    history: Arc<HistoryStore>,
}

impl Reviewer {
    pub fn new(orchestrator: Orchestrator, history: Arc<HistoryStore>) -> Self {
        Self {
            orchestrator,
            history,
        }
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Review `request.code` and record the result under `session_id`
    /// (a fresh id is generated when none is given).
    pub async fn analyze(
        &self,
        session_id: Option<&str>,
        request: AnalyzeRequest,
    ) -> Result<Analysis, ReviewError> {
        validate_code(&request.code)?;
        let language = normalize_language(&request.language);
        let session_id = session_id
            .map(str::to_string)
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let prompt = review_prompt(&language, &request.code);
        let mut report = self
            .orchestrator
            .complete(&prompt, request.model.as_deref())
            .await?;
        apply_review_defaults(&mut report, &request.code);

        let history_entry = self
            .history
            .record(&session_id, history_entry_for(&language, &request.code, &report));
        info!(
            session = %session_id,
            language = %language,
            issues = history_entry.entry.issue_count,
            "analysis recorded"
        );

        Ok(Analysis {
            session_id,
            report,
            history_entry,
        })
    }

    /// Produce a rewritten version of `request.code`. The language is passed
    /// through as given. Not recorded in history.
    pub async fn rewrite(&self, request: RewriteRequest) -> Result<StructuredObject, ReviewError> {
        validate_code(&request.code)?;

        let prompt = rewrite_prompt(&request.language, &request.code, &request.issues);
        let mut rewrite = self
            .orchestrator
            .complete(&prompt, request.model.as_deref())
            .await?;
        apply_rewrite_defaults(&mut rewrite, &request.code);
        Ok(rewrite)
    }
}

fn validate_code(code: &str) -> Result<(), ReviewError> {
    if code.trim().is_empty() {
        return Err(ReviewError::InvalidInput("Code cannot be empty".to_string()));
    }
    if code.chars().count() > MAX_CODE_CHARS {
        return Err(ReviewError::InvalidInput(
            "Code too large (max 50,000 characters)".to_string(),
        ));
    }
    Ok(())
}

/// Lower-case known languages; pass unknown ones through unchanged.
pub fn normalize_language(language: &str) -> String {
    let lang = language.trim().to_lowercase();
    if SUPPORTED_LANGUAGES.contains(&lang.as_str()) {
        lang
    } else {
        language.to_string()
    }
}

pub fn apply_review_defaults(report: &mut StructuredObject, code: &str) {
    let defaults = [
        ("overallScore", json!(0)),
        ("grade", json!("N/A")),
        ("summary", json!("Analysis complete.")),
        ("bugs", json!([])),
        ("performance", json!([])),
        ("security", json!([])),
        ("bestPractices", json!([])),
        (
            "metrics",
            json!({
                "linesOfCode": code.lines().count(),
                "complexity": "unknown",
                "maintainability": 0,
                "testability": 0,
                "readability": 0
            }),
        ),
        ("positives", json!([])),
    ];
    fill_missing(report, defaults);
}

pub fn apply_rewrite_defaults(rewrite: &mut StructuredObject, code: &str) {
    let defaults = [
        ("optimizedCode", json!(code)),
        ("changes", json!([])),
        ("explanation", json!("Code has been optimized.")),
    ];
    fill_missing(rewrite, defaults);
}

fn fill_missing<const N: usize>(object: &mut StructuredObject, defaults: [(&str, Value); N]) {
    for (key, value) in defaults {
        object.entry(key).or_insert(value);
    }
}

fn history_entry_for(language: &str, code: &str, report: &StructuredObject) -> NewEntry {
    let count = |key: &str| report.get(key).and_then(Value::as_array).map_or(0, Vec::len);
    let field = |key: &str| report.get(key).cloned().unwrap_or(Value::Null);

    NewEntry {
        language: language.to_string(),
        score: field("overallScore"),
        grade: field("grade"),
        summary: field("summary"),
        issue_count: count("bugs") + count("security") + count("performance"),
        code_snippet: truncate_with_ellipsis(code, SNIPPET_CHARS),
    }
}
