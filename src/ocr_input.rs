//! Inputs handed over by the upstream OCR stage.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::borrow::Cow;

pub const SUCCESS_STATUS: &str = "success";

/// Output of the OCR stage as serialized to JSON.
///
/// Fields stay untyped so a stage that reports `"status": false` or an object
/// `error` is still gated as a failure instead of being rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrStageResult {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub file_path: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl OcrStageResult {
    /// Only the string `"success"` counts as success.
    pub fn is_success(&self) -> bool {
        self.status.as_ref().and_then(Value::as_str) == Some(SUCCESS_STATUS)
    }

    /// OCR text; absent or null is empty, non-strings are rendered as JSON.
    pub fn text(&self) -> Cow<'_, str> {
        render(self.text.as_ref()).unwrap_or(Cow::Borrowed(""))
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_ref().and_then(Value::as_str)
    }

    /// The stage's own error message, rendered as JSON when not a string.
    pub fn error_message(&self) -> Option<Cow<'_, str>> {
        render(self.error.as_ref())
    }
}

fn render(value: Option<&Value>) -> Option<Cow<'_, str>> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s)),
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// What an input file turned out to contain.
#[derive(Debug, Clone)]
pub enum InputDocument {
    /// A JSON object carrying both `status` and `text`.
    OcrResult(OcrStageResult),
    /// Anything else, taken verbatim.
    RawText(String),
}

impl InputDocument {
    /// Classify file content by key presence alone. JSON lacking
    /// `status`/`text` is raw text too.
    pub fn detect(content: &str) -> Self {
        match serde_json::from_str::<Map<String, Value>>(content) {
            Ok(mut map) if map.contains_key("status") && map.contains_key("text") => {
                InputDocument::OcrResult(OcrStageResult {
                    status: map.remove("status"),
                    text: map.remove("text"),
                    file_path: map.remove("file_path"),
                    error: map.remove("error"),
                })
            }
            _ => InputDocument::RawText(content.to_string()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InputDocument::OcrResult(_) => "OCR JSON result",
            InputDocument::RawText(_) => "Raw text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_ocr_result() {
        let doc = InputDocument::detect(
            r#"{"status": "success", "text": "Hello", "file_path": "scan.jpg"}"#,
        );
        match doc {
            InputDocument::OcrResult(result) => {
                assert!(result.is_success());
                assert_eq!(result.text(), "Hello");
                assert_eq!(result.file_path(), Some("scan.jpg"));
            }
            other => panic!("expected OCR result, got {:?}", other),
        }
    }

    #[test]
    fn test_json_without_ocr_keys_is_raw_text() {
        let content = r#"{"title": "notes"}"#;
        assert!(matches!(
            InputDocument::detect(content),
            InputDocument::RawText(ref t) if t == content
        ));
    }

    #[test]
    fn test_mistyped_ocr_fields_still_detected_as_ocr_result() {
        let doc = InputDocument::detect(
            r#"{"status": false, "text": null, "error": {"code": 7, "message": "scan failed"}}"#,
        );
        match doc {
            InputDocument::OcrResult(result) => {
                assert!(!result.is_success());
                assert_eq!(result.text(), "");
                assert_eq!(
                    result.error_message().as_deref(),
                    Some(r#"{"code":7,"message":"scan failed"}"#)
                );
            }
            other => panic!("expected OCR result, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text() {
        let doc = InputDocument::detect("RECEIPT\nTotal 4.50");
        assert_eq!(doc.label(), "Raw text");
    }

    #[test]
    fn test_failed_stage() {
        let result: OcrStageResult =
            serde_json::from_str(r#"{"status": "error", "error": "scan failed"}"#).unwrap();
        assert!(!result.is_success());
        assert_eq!(result.text(), "");
        assert_eq!(result.error_message().as_deref(), Some("scan failed"));
    }

    #[test]
    fn test_non_string_status_is_not_success() {
        for status in ["500", "true", "null", r#"{"ok": true}"#, r#""SUCCESS""#] {
            let json = format!(r#"{{"status": {}, "text": "x"}}"#, status);
            let result: OcrStageResult = serde_json::from_str(&json).unwrap();
            assert!(!result.is_success(), "status {} treated as success", status);
        }
    }
}
