// src/pipeline/dedup.rs
//! Near-duplicate detection for free-text sources.
//!
//! News titles from different outlets rarely match byte-for-byte, so
//! candidates are compared by normalized-title similarity
//! (`strsim::normalized_levenshtein`) against a window of recent articles
//! from the same source. At or above the threshold the candidate is skipped
//! entirely: no insert, no update.

use once_cell::sync::Lazy;
use regex::Regex;
use strsim::normalized_levenshtein;

/// Lowercase, strip bracketed/parenthetical segments, drop everything that
/// is not alphanumeric (Unicode letters, so Hangul survives), collapse
/// whitespace.
pub fn normalize_title(title: &str) -> String {
    static RE_BRACKETS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)").expect("bracket regex"));

    let lowered = title.to_lowercase();
    let stripped = RE_BRACKETS.replace_all(&lowered, " ");

    let mut out = String::with_capacity(stripped.len());
    let mut last_space = false;
    for ch in stripped.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_space = false;
        } else if !last_space && !out.is_empty() {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// True when the candidate title is similar (>= threshold) to any of the
/// recent titles. Both sides are normalized before comparison.
pub fn is_near_duplicate<'a, I>(candidate_title: &str, recent_titles: I, threshold: f64) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let cand = normalize_title(candidate_title);
    if cand.is_empty() {
        return false;
    }
    recent_titles.into_iter().any(|t| {
        let norm = normalize_title(t);
        !norm.is_empty() && normalized_levenshtein(&cand, &norm) >= threshold
    })
}
