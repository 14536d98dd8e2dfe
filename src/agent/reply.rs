//! Structured-reply extraction
//!
//! Model replies are free text that should contain a JSON object. The object
//! is located by bracket matching (ignoring braces inside strings), so
//! surrounding prose or markdown fences are tolerated. Callers decide what to
//! do when no object is found; most fall back to the raw text.

use crate::errors::{NetError, Result};
use serde_json::Value;

/// Byte range of the first complete top-level JSON object
///
/// ```text
/// depth ← 0, start ← None
/// for each char c outside string literals:
///   '{' → if depth = 0 { start ← i }; depth += 1
///   '}' → depth -= 1; if depth = 0 { return text[start..=i] }
/// ```
pub fn find_json_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            escape_next = true;
            continue;
        }

        if ch == '"' && start.is_some() {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        match ch {
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(&text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse the JSON object embedded in a reply
pub fn parse_structured(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let candidate = find_json_object(trimmed)
        .ok_or_else(|| NetError::JsonParseError("No JSON object in reply".to_string()))?;

    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(NetError::JsonParseError("Reply is not a JSON object".to_string())),
        Err(e) => Err(NetError::JsonParseError(format!("Malformed JSON in reply: {}", e))),
    }
}

/// Named field of the embedded object as text, or the whole reply when the
/// object or field is missing
pub fn field_or_raw(text: &str, field: &str) -> String {
    match parse_structured(text) {
        Ok(value) => match value.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => text.to_string(),
            Some(other) => render_value(other),
        },
        Err(_) => text.to_string(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}
