//! Writing structured results next to their input file.

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

pub const OUTPUT_SUFFIX: &str = "_structured.json";

/// `scan.json` -> `scan_structured.json`, `notes` -> `notes_structured.json`.
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}", stem, OUTPUT_SUFFIX))
}

/// Write `value` as pretty-printed JSON.
pub fn write_pretty(path: &Path, value: &Value) -> io::Result<()> {
    let mut json = serde_json::to_string_pretty(value).map_err(io::Error::from)?;
    json.push('\n');
    fs::write(path, json)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Short human summary of a structured result.
pub fn summary(structured: &Map<String, Value>) -> Vec<(&'static str, String)> {
    let text_or = |value: Option<&Value>, default: &str| {
        value
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };

    let mut lines = vec![
        ("Document type", text_or(structured.get("document_type"), "unknown")),
        ("Confidence", text_or(structured.get("confidence"), "unknown")),
    ];

    if let Some(legibility) = structured
        .get("text_quality")
        .and_then(|q| q.get("overall_legibility"))
        .and_then(Value::as_str)
    {
        lines.push(("Legibility", legibility.to_string()));
    }

    if let Some(blocks) = structured
        .get("extracted_text")
        .and_then(|t| t.get("text_blocks"))
        .and_then(Value::as_array)
    {
        lines.push(("Text blocks", blocks.len().to_string()));
    }

    lines
}
