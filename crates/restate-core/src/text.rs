//! Helpers that shape submitted text before scoring and hashing.

/// Maximum subject length in characters before an ellipsis is appended.
pub const SUBJECT_MAX_CHARS: usize = 20;

/// Separator placed between typed text and attached-file text.
pub const ORIGINAL_SEPARATOR: &str = "\n\n";

/// Build the original text that gets scored and hashed.
///
/// Blank parts are dropped; two non-blank parts are joined with a blank line.
/// Changing this changes how attempts group, so it is fixed.
pub fn combine_original(typed: Option<&str>, extracted: Option<&str>) -> String {
    let typed = typed.filter(|s| !s.trim().is_empty());
    let extracted = extracted.filter(|s| !s.trim().is_empty());
    match (typed, extracted) {
        (None, None) => String::new(),
        (Some(a), None) => a.to_string(),
        (None, Some(b)) => b.to_string(),
        (Some(a), Some(b)) => format!("{a}{ORIGINAL_SEPARATOR}{b}"),
    }
}

/// Decode an attached source file. Only plain UTF-8 text is supported;
/// invalid sequences become U+FFFD.
pub fn extract_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Short label from the first sentence of `original` (split at `.` or newline).
#[must_use]
pub fn derive_subject(original: &str) -> String {
    if original.trim().is_empty() {
        return String::new();
    }
    let first = original.split(['.', '\n']).next().unwrap_or_default();
    match first.char_indices().nth(SUBJECT_MAX_CHARS) {
        Some((clip_idx, _)) => format!("{}...", &first[..clip_idx]),
        None => first.to_string(),
    }
}
