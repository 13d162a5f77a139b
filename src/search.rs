//! Search query normalizer
//!
//! Turns a free-text query into lowercase tokens for AND-matching.
//! Each adapter expands the tokens into per-token `LIKE` conditions.

/// Normalize a search query: lowercase, split on whitespace, drop tokens
/// shorter than 2 characters. Order is preserved.
///
/// An empty result means "no text filter", never "match nothing".
pub fn normalize_query(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|word| word.trim().to_lowercase())
        .filter(|word| word.chars().count() >= 2)
        .collect()
}
