// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT SCHEMAS
// ═══════════════════════════════════════════════════════════════════════════════

const REVIEW_OUTPUT: &str = r#"Return this exact JSON structure:
{
  "overallScore": <integer 0-100>,
  "grade": "<A+|A|B+|B|C+|C|D|F>",
  "summary": "<2-3 sentence executive summary of the code quality>",
  "bugs": [
    {"id": "BUG001", "line": <line_number_or_null>, "title": "<short title>", "description": "<detailed description>", "severity": "<critical|high|medium|low>", "fix": "<specific fix recommendation>"}
  ],
  "performance": [
    {"id": "PERF001", "line": <line_number_or_null>, "title": "<short title>", "description": "<detailed description>", "impact": "<high|medium|low>", "suggestion": "<specific optimization suggestion>"}
  ],
  "security": [
    {"id": "SEC001", "line": <line_number_or_null>, "title": "<short title>", "description": "<detailed description>", "severity": "<critical|high|medium|low>", "cwe": "<CWE-ID or null>", "fix": "<specific fix recommendation>"}
  ],
  "bestPractices": [
    {"id": "BP001", "line": <line_number_or_null>, "title": "<short title>", "description": "<detailed description>", "category": "<naming|structure|documentation|testing|patterns>", "recommendation": "<specific recommendation>"}
  ],
  "metrics": {
    "linesOfCode": <integer>,
    "complexity": "<low|medium|high|very_high>",
    "maintainability": <integer 0-100>,
    "testability": <integer 0-100>,
    "readability": <integer 0-100>
  },
  "positives": ["<thing done well>", "<another positive>"]
}

Rules:
- Be specific and actionable, not generic
- Line numbers must be accurate based on the actual code
- overallScore reflects true code quality (don't inflate)
- If no issues in a category, return empty array []
- Positives should highlight genuinely good practices found"#;

const REWRITE_OUTPUT: &str = r#"Return ONLY a valid JSON response with this structure:
{
  "optimizedCode": "<complete rewritten code as a string>",
  "changes": [
    {"type": "<bug_fix|performance|security|style|refactor>", "description": "<what was changed and why>"}
  ],
  "explanation": "<2-3 sentence summary of the major improvements made>"
}"#;

/// Used when the caller has no analysis findings to pass along.
const DEFAULT_ISSUES: &str = "- Fix all bugs, security issues, and performance problems found";

// ═══════════════════════════════════════════════════════════════════════════════
// PROMPTS
// ═══════════════════════════════════════════════════════════════════════════════

/// A finding from a previous analysis, passed to the rewrite prompt.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Issue {
    pub title: String,
    pub description: String,
}

pub fn review_prompt(language: &str, code: &str) -> String {
    format!(
        "You are an expert senior software engineer and code reviewer with 15+ years of \
         experience across multiple languages and paradigms.\n\n\
         Analyze the following {language} code thoroughly and return ONLY a valid JSON response \
         (no markdown, no explanation outside JSON).\n\n\
         Code to analyze:\n```{language}\n{code}\n```\n\n{REVIEW_OUTPUT}\n"
    )
}

pub fn rewrite_prompt(language: &str, code: &str, issues: &[Issue]) -> String {
    let issues_summary = issues_summary(issues);
    format!(
        "You are an expert senior software engineer. Rewrite the following {language} code to be \
         production-ready.\n\n\
         Original code:\n```{language}\n{code}\n```\n\n\
         Issues to fix (from analysis):\n{issues_summary}\n\n\
         {REWRITE_OUTPUT}\n\n\
         Rules:\n\
         - The optimizedCode must be complete and runnable\n\
         - Fix ALL identified bugs, security issues, and performance problems\n\
         - Follow {language} best practices and idiomatic patterns\n\
         - Add appropriate comments for complex logic\n\
         - Preserve the original functionality\n\
         - Do NOT add markdown code fences inside the JSON string\n"
    )
}

fn issues_summary(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return DEFAULT_ISSUES.to_string();
    }
    issues
        .iter()
        .map(|issue| format!("- {}: {}", issue.title, issue.description))
        .collect::<Vec<_>>()
        .join("\n")
}
