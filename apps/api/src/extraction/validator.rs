//! Output validation: turns raw model text into a `ResumeRecord` or a
//! `SchemaViolation`.
//!
//! Tolerated: surrounding whitespace, one markdown code fence, omitted keys,
//! explicit `null` for string fields, unknown extra keys (ignored).
//! Rejected: non-JSON or truncated payloads, a non-object top level, and any
//! field whose type does not match the schema (e.g. `"skills": "Python, Go"`).

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::extraction::schema::{FieldKind, ResumeRecord, RESUME_FIELDS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("Model output is not valid JSON: {0}")]
    Malformed(String),

    #[error("Model output must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Field '{field}' must be {expected}, got {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Validates raw model output against the resume schema.
pub fn validate(raw: &str) -> Result<ResumeRecord, SchemaViolation> {
    let payload = strip_json_fences(raw);
    let value: Value =
        serde_json::from_str(payload).map_err(|e| SchemaViolation::Malformed(e.to_string()))?;

    let map = match value {
        Value::Object(map) => map,
        other => return Err(SchemaViolation::NotAnObject(type_name(&other))),
    };

    let mut record = ResumeRecord::default();

    for field in RESUME_FIELDS {
        let entry = map.get(field.name);
        match field.kind {
            FieldKind::OptionalString => {
                let parsed = match entry {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(other) => {
                        return Err(SchemaViolation::WrongType {
                            field: field.name,
                            expected: "a string or null",
                            found: type_name(other),
                        })
                    }
                };
                if let Some(slot) = record.optional_slot(field.name) {
                    *slot = parsed;
                }
            }
            FieldKind::StringList => {
                let parsed = match entry {
                    None => Vec::new(),
                    Some(Value::Array(items)) => string_items(field.name, items)?,
                    Some(other) => {
                        return Err(SchemaViolation::WrongType {
                            field: field.name,
                            expected: "a list of strings",
                            found: type_name(other),
                        })
                    }
                };
                if let Some(slot) = record.list_slot(field.name) {
                    *slot = parsed;
                }
            }
        }
    }

    let unknown: Vec<&str> = map
        .keys()
        .map(String::as_str)
        .filter(|k| !RESUME_FIELDS.iter().any(|f| f.name == *k))
        .collect();
    if !unknown.is_empty() {
        debug!("Ignoring unknown keys in model output: {:?}", unknown);
    }

    Ok(record)
}

fn string_items(field: &'static str, items: &[Value]) -> Result<Vec<String>, SchemaViolation> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(SchemaViolation::WrongType {
                field,
                expected: "a list of strings",
                found: match other {
                    Value::Null => "a list containing null",
                    _ => "a list containing non-string items",
                },
            }),
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
