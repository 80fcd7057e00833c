/// Truncate a string to at most `max_chars` characters (Unicode-safe).
///
/// Used for the bounded diagnostic prefixes carried by errors and log lines.
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Truncate for display, appending `...` when anything was cut.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let prefix = truncate_str(s, max_chars);
    if prefix.len() < s.len() {
        format!("{}...", prefix)
    } else {
        prefix.to_string()
    }
}
