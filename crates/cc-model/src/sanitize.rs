//! Filesystem-safe names for folders and rendered documents.

/// Characters Windows refuses in a path component.
const INVALID_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replacement for names that sanitize to nothing.
pub const UNTITLED: &str = "untitled";

/// Make `name` usable as a single path component.
///
/// Invalid characters become `_`, surrounding spaces and periods are
/// trimmed, and an empty result becomes [`UNTITLED`]. The function is
/// idempotent and never returns an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|ch| if INVALID_CHARS.contains(&ch) { '_' } else { ch })
        .collect();
    let trimmed = replaced.trim_matches(|ch| ch == ' ' || ch == '.');
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}
