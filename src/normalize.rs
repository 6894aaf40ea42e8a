//! Turning a model's free-text reply into a JSON object.

use crate::outcome::{now_timestamp, UNKNOWN_SOURCE};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

/// Marker some models use to wrap JSON in a code block.
pub const FENCE: &str = "```";

/// The reply could not be decoded as a JSON object.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    /// Reply text exactly as it was received.
    pub raw_response: String,
    /// Decoder diagnostic.
    pub message: String,
}

/// Strip a code fence by keeping the first `{` through the last `}`.
///
/// Text that does not start with a fence, or has no usable brace pair, is
/// returned unchanged.
pub fn trim_fenced(text: &str) -> &str {
    if !text.starts_with(FENCE) {
        return text;
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Decode a model reply into a JSON object.
pub fn normalize_response(response: &str) -> Result<Map<String, Value>, ParseError> {
    let candidate = trim_fenced(response.trim());
    debug!(
        "Normalizing response: {} chars received, {} chars after trimming",
        response.len(),
        candidate.len()
    );

    let fail = |message: String| ParseError {
        raw_response: response.to_string(),
        message,
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(fail(format!(
            "expected a JSON object, found {}",
            value_kind(&other)
        ))),
        Err(e) => Err(fail(e.to_string())),
    }
}

/// Insert (or overwrite) the `metadata` key on a decoded reply.
pub fn stamp_metadata(
    structured: &mut Map<String, Value>,
    source_file: Option<&str>,
    agent_model: &str,
    original_text_length: usize,
) {
    structured.insert(
        "metadata".to_string(),
        json!({
            "source_file": source_file.unwrap_or(UNKNOWN_SOURCE),
            "processing_timestamp": now_timestamp(),
            "agent_model": agent_model,
            "original_text_length": original_text_length,
        }),
    );
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
