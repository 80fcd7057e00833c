//! CodeRefine - AI code review from the terminal
//!
//! Sends a file to hosted LLMs through a primary/fallback model chain and
//! prints the structured review (or rewrite) as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coderefine::prompts::Issue;
use coderefine::{
    logging, AnalyzeRequest, Config, ConfigError, HistoryStore, Orchestrator, Reviewer,
    RewriteRequest,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "coderefine",
    about = "AI-powered code review and optimization",
    long_about = "Reviews source files with hosted LLMs (via OpenRouter).\n\n\
                  Models are tried one at a time: the primary chain first, then the\n\
                  fallback chain. Set OPENROUTER_API_KEY before running.",
    version
)]
struct Args {
    /// Log every model attempt
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Review files for bugs, performance, security and best practices
    Analyze {
        /// Files to review
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Language of the code (inferred from the file extension by default)
        #[arg(short, long)]
        language: Option<String>,

        /// Model to try before the configured primary chain
        #[arg(short, long)]
        model: Option<String>,

        /// Session id to group the analyses under
        #[arg(long)]
        session: Option<String>,
    },

    /// Rewrite a file into a production-ready version
    Rewrite {
        file: PathBuf,

        #[arg(short, long)]
        language: Option<String>,

        /// Issue to fix, as "title: description" (repeatable)
        #[arg(long = "issue")]
        issues: Vec<String>,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show the configured endpoint and model chains
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = Config::load().context("Invalid configuration")?;

    match args.command {
        Command::Models => print_models(&config),
        Command::Analyze {
            files,
            language,
            model,
            session,
        } => {
            let reviewer = build_reviewer(&config)?;
            analyze(&reviewer, &files, language, model, session).await
        }
        Command::Rewrite {
            file,
            language,
            issues,
            model,
        } => {
            let reviewer = build_reviewer(&config)?;
            let code = read_source(&file)?;
            let request = RewriteRequest {
                code,
                language: language.unwrap_or_else(|| infer_language(&file).to_string()),
                issues: issues.iter().map(|raw| parse_issue(raw)).collect(),
                model,
            };
            let rewrite = reviewer
                .rewrite(request)
                .await
                .with_context(|| format!("Rewrite of {} failed", file.display()))?;
            print_json(&json!({ "success": true, "rewrite": rewrite }))
        }
    }
}

fn build_reviewer(config: &Config) -> Result<Reviewer> {
    let orchestrator = Orchestrator::new(config).map_err(|err| match err {
        coderefine::OrchestrationError::Config(ConfigError::MissingCredential) => anyhow::anyhow!(
            "OPENROUTER_API_KEY is not set. Get a free key at https://openrouter.ai/keys"
        ),
        other => anyhow::Error::new(other),
    })?;
    Ok(Reviewer::new(orchestrator, Arc::new(HistoryStore::new())))
}

async fn analyze(
    reviewer: &Reviewer,
    files: &[PathBuf],
    language: Option<String>,
    model: Option<String>,
    session: Option<String>,
) -> Result<()> {
    let mut session_id = session;
    let mut results = Vec::with_capacity(files.len());

    for file in files {
        let code = read_source(file)?;
        let request = AnalyzeRequest {
            code,
            language: language
                .clone()
                .unwrap_or_else(|| infer_language(file).to_string()),
            model: model.clone(),
        };
        let analysis = reviewer
            .analyze(session_id.as_deref(), request)
            .await
            .with_context(|| format!("Analysis of {} failed", file.display()))?;

        session_id = Some(analysis.session_id.clone());
        results.push(json!({
            "file": file.display().to_string(),
            "analysis": analysis.report,
        }));
    }

    let session_id = session_id.unwrap_or_default();
    let history = reviewer.history().entries(&session_id);
    print_json(&json!({
        "success": true,
        "sessionId": session_id,
        "results": results,
        "history": history,
        "total": history.len(),
    }))
}

fn print_models(config: &Config) -> Result<()> {
    print_json(&json!({
        "status": "ok",
        "endpoint": config.endpoint,
        "timeoutSecs": config.request_timeout.as_secs(),
        "primary": config.primary,
        "fallback": config.fallback,
        "apiKeyConfigured": config.has_api_key(),
    }))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Parse `"title: description"`; text without a colon becomes the title.
fn parse_issue(raw: &str) -> Issue {
    match raw.split_once(':') {
        Some((title, description)) => Issue {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
        },
        None => Issue {
            title: raw.trim().to_string(),
            description: String::new(),
        },
    }
}

fn infer_language(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "py" => "python",
        "js" | "mjs" | "cjs" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "go" => "go",
        "rs" => "rust",
        "php" => "php",
        "rb" => "ruby",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "sql" => "sql",
        "sh" | "bash" => "bash",
        "html" | "htm" => "html",
        "css" => "css",
        _ => "text",
    }
}
