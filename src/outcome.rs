//! Result types returned by the structuring pipeline.
//!
//! Every entry point yields an [`Outcome`]: either the model's JSON object with
//! a `metadata` block attached, or an [`ErrorResult`] describing what failed.

use crate::agent::TransportError;
use crate::normalize::ParseError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const UNKNOWN_SOURCE: &str = "unknown";

/// Current local time as an RFC 3339 timestamp.
pub fn now_timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

/// Failure categories reported through an [`ErrorResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The prior OCR stage reported failure.
    UpstreamStatus,
    EmptyInput,
    /// The model reply was not a JSON object, even after fence trimming.
    ResponseParse,
    /// Creating the client/agent or submitting the request failed.
    Transport,
    /// The prior-stage payload itself was not valid JSON.
    InvalidOcrResult,
}

impl ErrorKind {
    /// Human-readable category placed in the `error` field.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::UpstreamStatus => "OCR processing failed",
            ErrorKind::EmptyInput => "No text extracted from OCR",
            ErrorKind::ResponseParse => "JSON parsing failed",
            ErrorKind::Transport => "Processing failed",
            ErrorKind::InvalidOcrResult => "Invalid OCR result JSON",
        }
    }
}

/// Internal pipeline failure, converted to an [`ErrorResult`] at the boundary.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("OCR stage reported failure: {0}")]
    UpstreamStatus(String),
    #[error("no text to process")]
    EmptyInput,
    #[error("failed to parse agent response as JSON: {0}")]
    ResponseParse(#[from] ParseError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("invalid OCR result JSON: {0}")]
    InvalidOcrResult(#[from] serde_json::Error),
}

impl StructureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StructureError::UpstreamStatus(_) => ErrorKind::UpstreamStatus,
            StructureError::EmptyInput => ErrorKind::EmptyInput,
            StructureError::ResponseParse(_) => ErrorKind::ResponseParse,
            StructureError::Transport(_) => ErrorKind::Transport,
            StructureError::InvalidOcrResult(_) => ErrorKind::InvalidOcrResult,
        }
    }

    /// Diagnostic detail for the `error_details` field.
    fn details(&self) -> Option<String> {
        match self {
            StructureError::UpstreamStatus(msg) => Some(msg.clone()),
            StructureError::EmptyInput => None,
            StructureError::ResponseParse(e) => Some(e.message.clone()),
            StructureError::Transport(e) => Some(e.to_string()),
            StructureError::InvalidOcrResult(e) => Some(e.to_string()),
        }
    }

    /// Convert into the serializable error shape.
    pub fn into_result(self, source_file: Option<&str>, agent_model: Option<&str>) -> ErrorResult {
        let kind = self.kind();
        let error_details = self.details();
        let raw_response = match self {
            StructureError::ResponseParse(e) => Some(e.raw_response),
            _ => None,
        };

        ErrorResult {
            error: kind.message().to_string(),
            error_kind: kind,
            error_details,
            raw_response,
            metadata: ErrorMetadata {
                source_file: source_file.unwrap_or(UNKNOWN_SOURCE).to_string(),
                processing_timestamp: now_timestamp(),
                agent_model: agent_model.map(str::to_string),
            },
        }
    }
}

/// Structured error returned instead of raising.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: String,
    pub error_kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    pub metadata: ErrorMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMetadata {
    pub source_file: String,
    pub processing_timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_model: Option<String>,
}

/// Outcome of one structuring call.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    /// The model's JSON object with `metadata` attached.
    Structured(Map<String, Value>),
    Failed(ErrorResult),
}

impl Outcome {
    pub fn is_structured(&self) -> bool {
        matches!(self, Outcome::Structured(_))
    }

    pub fn structured(&self) -> Option<&Map<String, Value>> {
        match self {
            Outcome::Structured(map) => Some(map),
            Outcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorResult> {
        match self {
            Outcome::Structured(_) => None,
            Outcome::Failed(err) => Some(err),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_carries_detail() {
        let result = StructureError::UpstreamStatus("scan failed".to_string())
            .into_result(Some("scan.jpg"), None);
        assert_eq!(result.error_kind, ErrorKind::UpstreamStatus);
        assert_eq!(result.error, "OCR processing failed");
        assert_eq!(result.error_details.as_deref(), Some("scan failed"));
        assert_eq!(result.metadata.source_file, "scan.jpg");
        assert!(result.raw_response.is_none());
    }

    #[test]
    fn test_parse_error_keeps_raw_response() {
        let err = ParseError {
            raw_response: "```\nnope\n```".to_string(),
            message: "expected value at line 1 column 1".to_string(),
        };
        let result = StructureError::from(err).into_result(None, Some("gpt-4o-mini"));
        assert_eq!(result.error_kind, ErrorKind::ResponseParse);
        assert_eq!(result.raw_response.as_deref(), Some("```\nnope\n```"));
        assert_eq!(result.metadata.source_file, UNKNOWN_SOURCE);
        assert_eq!(result.metadata.agent_model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_error_result_serialization_shape() {
        let outcome = Outcome::Failed(StructureError::EmptyInput.into_result(None, None));
        let value = outcome.to_value();
        assert_eq!(value["error"], "No text extracted from OCR");
        assert_eq!(value["error_kind"], "empty_input");
        assert!(value.get("error_details").is_none());
        assert!(value.get("raw_response").is_none());
        assert!(value["metadata"]["processing_timestamp"].is_string());
        assert!(value["metadata"].get("agent_model").is_none());
    }

    #[test]
    fn test_structured_outcome_serializes_as_plain_object() {
        let mut map = Map::new();
        map.insert("confidence".to_string(), Value::String("high".to_string()));
        let outcome = Outcome::Structured(map);
        assert!(outcome.is_structured());
        assert_eq!(outcome.to_value(), serde_json::json!({"confidence": "high"}));
    }
}
