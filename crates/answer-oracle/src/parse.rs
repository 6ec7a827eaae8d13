//! Permissive parsing of free-text oracle output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static CONTROL_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\|[^>]*\|>").expect("control token pattern"));

/// Why a batch response could not be turned into an answer list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("response was empty")]
    Empty,
    #[error("response contains no bracketed array")]
    NoArray,
    #[error("bracketed content is not a JSON array")]
    NotAnArray,
    #[error("bracketed content is not valid JSON: {0}")]
    Invalid(String),
}

/// Removes chat-template control tokens such as `<|start|>assistant<|message|>` and trims.
pub fn sanitize(text: &str) -> String {
    CONTROL_TOKENS.replace_all(text, "").trim().to_string()
}

/// Two-stage parse: strict JSON array first, then the outermost `[...]` span.
pub fn parse_answer_array(raw: &str) -> Result<Vec<String>, ParseFailure> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseFailure::Empty);
    }

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(stringify(items));
    }

    let candidate = extract_json_array(trimmed).ok_or(ParseFailure::NoArray)?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Array(items)) => Ok(stringify(items)),
        Ok(_) => Err(ParseFailure::NotAnArray),
        Err(err) => Err(ParseFailure::Invalid(err.to_string())),
    }
}

/// Span from the first `[` to the last `]`, if both exist in that order.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

fn stringify(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| match item {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}
