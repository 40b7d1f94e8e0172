//! Text normalization shared by corpus embedding and query encoding.
//!
//! The corpus vectors were computed from text cleaned exactly this way; any
//! change here silently shifts queries away from the corpus in embedding space.

/// Normalize text before embedding.
///
/// Drops every character that is neither an ASCII letter nor whitespace, then
/// lower-cases what is left. Digits, punctuation, diacritics and non-Latin
/// scripts disappear entirely.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic() || is_space(*c))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalize an optional field; a missing value normalizes to `""`.
#[must_use]
pub fn normalize_field(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

// Unicode whitespace plus the ASCII information separators, which the corpus
// cleaner also treated as whitespace.
fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}
