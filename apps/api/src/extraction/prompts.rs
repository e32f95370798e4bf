// Resume extraction prompt template.
// Both placeholders are substituted verbatim.

pub const RESUME_PARSE_PROMPT: &str = r#"Parse the resume below into a single JSON object.

Return ONLY valid JSON that strictly follows the schema.
RULES:
1. If a field is missing from the resume, use null. Never omit a key and never invent a value.
2. skills MUST be a list of strings. Use [] if no skills are listed.
3. Do NOT add keys that are not in the schema.
4. Do NOT add explanations, commentary, or any text before or after the JSON.

RESUME TEXT:
{resume_text}

{format_instructions}"#;

/// Renders the extraction prompt for one resume.
pub fn build_prompt(resume_text: &str, format_instructions: &str) -> String {
    // Resume text containing a literal "{format_instructions}" must not be expanded.
    let (head, tail) = RESUME_PARSE_PROMPT
        .split_once("{resume_text}")
        .unwrap_or((RESUME_PARSE_PROMPT, ""));
    let tail = tail.replace("{format_instructions}", format_instructions);
    format!("{head}{resume_text}{tail}")
}
