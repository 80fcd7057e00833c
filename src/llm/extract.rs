//! Recover a JSON object from free-form model output.
//!
//! Models are told to answer with bare JSON, but free-tier backends routinely
//! wrap it in code fences or surround it with commentary. Extraction runs two
//! fixed steps: strip a code fence, then try each parse candidate in order.

use super::error::MalformedResponse;
use crate::util::truncate_str;
use regex::Regex;
use serde_json::error::Category;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Structured result recovered from a model response.
pub type StructuredObject = Map<String, Value>;

const FENCE: &str = "```";

/// Maximum characters of offending text kept in a [`MalformedResponse`].
const MAX_TEXT_PREFIX: usize = 500;

/// A parse candidate: selects the slice of text to hand to the JSON parser.
type Candidate = fn(&str) -> Option<&str>;

/// Tried in order; the first candidate that parses wins.
const CANDIDATES: [Candidate; 2] = [whole_text, brace_span];

/// Remove a surrounding code fence, if any.
///
/// The opening fence line (including any language tag) is always dropped when
/// the text starts with a fence. The last line is dropped only when it is a
/// closing fence.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed;
    }

    let body = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return "",
    };

    let body = body.trim_end();
    match body.rfind('\n') {
        Some(idx) if body[idx + 1..].trim() == FENCE => body[..idx].trim(),
        None if body.trim() == FENCE => "",
        _ => body.trim(),
    }
}

/// The whole (fence-stripped) text.
pub fn whole_text(text: &str) -> Option<&str> {
    Some(text)
}

/// Greedy span from the first `{` to the last `}`.
pub fn brace_span(text: &str) -> Option<&str> {
    static BRACE_SPAN: OnceLock<Option<Regex>> = OnceLock::new();
    let re = BRACE_SPAN
        .get_or_init(|| Regex::new(r"(?s)\{.*\}").ok())
        .as_ref()?;
    re.find(text).map(|m| m.as_str())
}

/// Convert raw model text into a JSON object.
///
/// Text that is valid JSON but not an object is rejected as is; later
/// candidates only run after a syntax error. On failure the error carries the
/// parse error of the first candidate (the direct parse) and a bounded prefix
/// of the fence-stripped text.
pub fn extract_object(raw: &str) -> Result<StructuredObject, MalformedResponse> {
    let text = strip_code_fence(raw);

    let mut first_error: Option<serde_json::Error> = None;
    for candidate in CANDIDATES {
        let Some(slice) = candidate(text) else {
            continue;
        };
        match serde_json::from_str::<StructuredObject>(slice) {
            Ok(object) => return Ok(object),
            Err(err) => {
                let well_formed = err.classify() == Category::Data;
                first_error.get_or_insert(err);
                if well_formed {
                    break;
                }
            }
        }
    }

    Err(MalformedResponse {
        parse_error: first_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no JSON candidate found".to_string()),
        text_prefix: truncate_str(text, MAX_TEXT_PREFIX).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> StructuredObject {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_strip_code_fence_with_language_tag() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fence(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fence_without_closing_fence() {
        let text = "```\n{\"a\": 1}\n";
        assert_eq!(strip_code_fence(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fence_keeps_last_line_when_not_a_fence() {
        let text = "```json\n{\"a\": 1}\n}";
        assert_eq!(strip_code_fence(text), "{\"a\": 1}\n}");
    }

    #[test]
    fn test_strip_code_fence_degenerate_inputs() {
        assert_eq!(strip_code_fence("```"), "");
        assert_eq!(strip_code_fence("```json"), "");
        assert_eq!(strip_code_fence("```\n```"), "");
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }

    #[test]
    fn test_brace_span_is_greedy() {
        let text = "x {\"a\": {\"b\": 1}} y } z";
        assert_eq!(brace_span(text), Some("{\"a\": {\"b\": 1}} y }"));
        assert_eq!(brace_span("no braces"), None);
        assert_eq!(brace_span("} backwards {"), None);
    }

    #[test]
    fn test_brace_span_crosses_lines() {
        let text = "Here:\n{\n  \"a\": 1\n}\nDone";
        assert_eq!(brace_span(text), Some("{\n  \"a\": 1\n}"));
    }

    #[test]
    fn test_extract_plain_json_unchanged() {
        let raw = r#"{"overallScore": 80, "bugs": [{"id": "BUG001"}]}"#;
        let parsed = extract_object(raw).unwrap();
        assert_eq!(parsed, obj(json!({"overallScore": 80, "bugs": [{"id": "BUG001"}]})));
    }

    #[test]
    fn test_extract_fenced_matches_plain() {
        let plain = r#"{"overallScore": 80, "grade": "B"}"#;
        let fenced = format!("```json\n{}\n```", plain);
        assert_eq!(extract_object(plain).unwrap(), extract_object(&fenced).unwrap());
    }

    #[test]
    fn test_extract_recovers_from_commentary() {
        let raw = r#"Sure! Here's the analysis: {"overallScore": 50} Hope that helps!"#;
        assert_eq!(extract_object(raw).unwrap(), obj(json!({"overallScore": 50})));
    }

    #[test]
    fn test_extract_top_level_array_is_malformed_without_object() {
        let err = extract_object("[1, 2, 3]").unwrap_err();
        assert!(err.parse_error.contains("invalid type"));
        assert_eq!(err.text_prefix, "[1, 2, 3]");
    }

    #[test]
    fn test_extract_does_not_dig_objects_out_of_valid_json() {
        for raw in [r#"[{"overallScore": 1}]"#, r#"[{"a": 1}, {"b": 2}]"#, r#""{\"a\": 1}""#] {
            let err = extract_object(raw).unwrap_err();
            assert!(err.parse_error.contains("invalid type"), "{raw}: {}", err.parse_error);
        }

        let fenced = "```json\n[{\"a\": 1}]\n```";
        assert!(extract_object(fenced).is_err());
    }

    #[test]
    fn test_extract_failure_reports_direct_parse_error_and_prefix() {
        let raw = format!("not json at all {}", "x".repeat(1000));
        let err = extract_object(&raw).unwrap_err();
        assert!(err.parse_error.contains("expected"));
        assert_eq!(err.text_prefix.chars().count(), 500);
        assert!(err.text_prefix.starts_with("not json at all"));
    }

    #[test]
    fn test_extract_rejects_broken_brace_span() {
        let raw = "note: {\"a\": 1,} trailing";
        assert!(extract_object(raw).is_err());
    }
}
