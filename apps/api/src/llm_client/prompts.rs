// Shared prompt constants.
// The extraction template itself lives in extraction/prompts.rs.

/// System prompt that enforces JSON-only output on every completion.
pub const JSON_ONLY_SYSTEM: &str = "You are an automated resume parsing system. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
