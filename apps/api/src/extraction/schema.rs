//! Resume schema: the fixed structured-output shape the model must fill.
//!
//! The field table below is the single source of truth: the format
//! instructions embedded in the prompt, the validator, and the CSV column
//! order are all derived from it.

use serde::{Deserialize, Serialize};

use crate::extraction::validator::{validate, SchemaViolation};

/// How a schema field is typed and what "absent" means for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string, or `null` when unknown. Missing keys default to `null`.
    OptionalString,
    /// A list of strings. Missing keys default to `[]`; `null` is rejected.
    StringList,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

/// Declaration order. Also the CSV column order (followed by `file_name`).
pub const RESUME_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        kind: FieldKind::OptionalString,
        description: "Full name of the candidate",
    },
    FieldSpec {
        name: "email",
        kind: FieldKind::OptionalString,
        description: "Primary email address",
    },
    FieldSpec {
        name: "phone",
        kind: FieldKind::OptionalString,
        description: "Primary phone number, as written in the resume",
    },
    FieldSpec {
        name: "skills",
        kind: FieldKind::StringList,
        description: "Technical and professional skills, in the order they appear",
    },
    FieldSpec {
        name: "education",
        kind: FieldKind::OptionalString,
        description: "Degrees and institutions, summarized as free text",
    },
    FieldSpec {
        name: "experience_summary",
        kind: FieldKind::OptionalString,
        description: "Short summary of professional experience",
    },
    FieldSpec {
        name: "linkedin",
        kind: FieldKind::OptionalString,
        description: "LinkedIn profile URL",
    },
    FieldSpec {
        name: "github",
        kind: FieldKind::OptionalString,
        description: "GitHub profile URL",
    },
];

/// One parsed resume. Serializes every key; unknown values are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub education: Option<String>,
    pub experience_summary: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

impl ResumeRecord {
    /// Mutable slot for an optional-string field, by schema name.
    pub(crate) fn optional_slot(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "name" => Some(&mut self.name),
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "education" => Some(&mut self.education),
            "experience_summary" => Some(&mut self.experience_summary),
            "linkedin" => Some(&mut self.linkedin),
            "github" => Some(&mut self.github),
            _ => None,
        }
    }

    /// Mutable slot for a list field, by schema name.
    pub(crate) fn list_slot(&mut self, field: &str) -> Option<&mut Vec<String>> {
        match field {
            "skills" => Some(&mut self.skills),
            _ => None,
        }
    }

    /// Parses raw model output into a record. See `validator::validate`.
    pub fn parse(raw: &str) -> Result<Self, SchemaViolation> {
        validate(raw)
    }
}

/// Renders the machine-readable shape description embedded in the prompt.
pub fn format_instructions() -> String {
    let mut properties = serde_json::Map::new();
    for field in RESUME_FIELDS {
        let property = match field.kind {
            FieldKind::OptionalString => serde_json::json!({
                "type": ["string", "null"],
                "description": field.description,
            }),
            FieldKind::StringList => serde_json::json!({
                "type": "array",
                "items": {"type": "string"},
                "description": field.description,
            }),
        };
        properties.insert(field.name.to_string(), property);
    }

    let required: Vec<&str> = RESUME_FIELDS.iter().map(|f| f.name).collect();
    let schema = serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    });

    // serde_json::Map keeps keys sorted; list the declaration order explicitly.
    let pretty = serde_json::to_string_pretty(&schema).unwrap_or_default();
    format!(
        "The output must be a single JSON object conforming to the JSON schema below.\n\
         Keys, in order: {}.\n\
         Every key must be present. Use null for any unknown string value and [] for no skills.\n\
         ```\n{pretty}\n```",
        required.join(", ")
    )
}
