//! JSON utilities for model responses and persisted artifacts

use serde::de::IgnoredAny;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Extract JSON content from markdown code blocks or raw text
///
/// Handles:
/// - Raw JSON text, returned as is even when string values contain fences
/// - ```json blocks
/// - Generic ``` blocks
pub fn extract_json(text: &str) -> String {
    let trimmed = text.trim();
    if serde_json::from_str::<IgnoredAny>(trimmed).is_ok() {
        return trimmed.to_string();
    }

    let fenced = if let Some(start) = text.find("```json") {
        Some(start + "```json".len())
    } else {
        text.find("```").map(|start| start + 3)
    };

    match fenced {
        Some(body_start) => {
            let body_end = text[body_start..]
                .rfind("```")
                .map(|pos| pos + body_start)
                .unwrap_or(text.len());
            text[body_start..body_end].trim().to_string()
        }
        None => trimmed.to_string(),
    }
}

/// Serialize an artifact as pretty JSON with four-space indentation
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}
