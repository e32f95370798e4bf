//! Text normalization between document extraction and prompt construction.

/// True when the trimmed text has at least `min_chars` characters.
pub fn is_viable(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}

/// Cuts `text` to at most `max_chars` characters, never splitting a character.
/// Text at or under the budget is returned unchanged.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
