//! Placeholder tokens left where binary values were extracted.
//!
//! Grammar: `@` followed by a base-10 tag, no sign, no leading zeros
//! (except `@0`). Only this canonical form is a placeholder; `@007`,
//! `@+1` and `@` are ordinary strings.

/// First character of every placeholder.
pub const PLACEHOLDER_PREFIX: char = '@';

/// Render the placeholder for `tag`.
pub fn format_placeholder(tag: u32) -> String {
    format!("{PLACEHOLDER_PREFIX}{tag}")
}

/// Parse a placeholder string, returning its tag.
pub fn parse_placeholder(value: &str) -> Option<u32> {
    let digits = value.strip_prefix(PLACEHOLDER_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Whether a string value would be read as a placeholder on the receiving side.
pub fn is_reserved(value: &str) -> bool {
    parse_placeholder(value).is_some()
}
