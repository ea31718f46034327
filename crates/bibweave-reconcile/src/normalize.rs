//! Author name normalization.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Decompose and drop combining marks: "Müller" → "Muller".
pub fn strip_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Canonical form for exact and token comparison: diacritics stripped,
/// lowercased, punctuation removed, internal whitespace collapsed.
pub fn normalize_name(s: &str) -> String {
    let stripped = strip_diacritics(s).to_lowercase();
    let cleaned: String = stripped
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lighter form used for edit-distance scoring: diacritics stripped and
/// lowercased, punctuation kept (a dropped period should cost distance).
pub fn fuzzy_normalize(s: &str) -> String {
    strip_diacritics(s).to_lowercase().trim().to_string()
}
