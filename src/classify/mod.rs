// src/classify/mod.rs
//! Rule-based topic/category classification.
//!
//! One engine shape for papers and model tasks (priority keywords, then
//! category hints, then a keyword scan, then the default), and a scoring
//! variant for news (most keyword hits across title+body wins).
//!
//! Rule tables are explicit ordered lists, never maps: first match wins at
//! every stage, and the tie-break order is a visible, testable property.

pub mod tables;

use serde::Deserialize;

/// One topic/category paired with its qualifying hints and keyword triggers.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationRule {
    pub label: String,
    /// Localized label, carried into optional columns (e.g. `task_ko`).
    #[serde(default)]
    pub label_ko: Option<String>,
    /// Qualifying structured hints (arXiv categories, pipeline tags, ...).
    #[serde(default)]
    pub categories: Vec<String>,
    /// Ordered keyword triggers, matched as lowercase substrings.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Priority rules pre-empt the category match when a keyword hits the title.
    #[serde(default)]
    pub priority: bool,
}

/// Ordered rule list plus the fallback label. Static configuration, loaded
/// once, immutable at runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleTable {
    pub rules: Vec<ClassificationRule>,
    pub default_label: String,
}

/// Generic ordered classification (papers, model tasks):
/// 1) first priority rule with a keyword in the lowercased title,
/// 2) first non-priority rule whose categories intersect the hints,
/// 3) first rule (any) with a keyword in the title,
/// 4) the default label.
pub fn classify(table: &RuleTable, title: &str, hints: &[String]) -> String {
    match_rule(table, title, hints)
        .map(|r| r.label.clone())
        .unwrap_or_else(|| table.default_label.clone())
}

/// Same walk as [`classify`] but exposing the matched rule, for callers that
/// need more than the label (localized task names).
pub fn match_rule<'a>(
    table: &'a RuleTable,
    title: &str,
    hints: &[String],
) -> Option<&'a ClassificationRule> {
    let title_lc = title.to_lowercase();
    let hints_lc: Vec<String> = hints.iter().map(|h| h.to_lowercase()).collect();

    for rule in table.rules.iter().filter(|r| r.priority) {
        if keyword_hit(&title_lc, &rule.keywords) {
            return Some(rule);
        }
    }
    for rule in table.rules.iter().filter(|r| !r.priority) {
        if rule
            .categories
            .iter()
            .any(|c| hints_lc.iter().any(|h| h == &c.to_lowercase()))
        {
            return Some(rule);
        }
    }
    table
        .rules
        .iter()
        .find(|rule| keyword_hit(&title_lc, &rule.keywords))
}

/// News classification: every rule is scored by keyword hits across
/// title+body; the highest score wins, declaration order breaks ties, and
/// zero hits everywhere yields the default label.
pub fn classify_news(table: &RuleTable, title: &str, body: &str) -> String {
    let text = format!("{} {}", title, body).to_lowercase();

    let mut best: Option<(&ClassificationRule, usize)> = None;
    for rule in &table.rules {
        let score = rule
            .keywords
            .iter()
            .filter(|k| text.contains(k.to_lowercase().as_str()))
            .count();
        if score == 0 {
            continue;
        }
        // Strictly-greater keeps the first declared rule on ties.
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((rule, score));
        }
    }
    best.map(|(r, _)| r.label.clone())
        .unwrap_or_else(|| table.default_label.clone())
}

fn keyword_hit(text_lc: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|k| !k.is_empty() && text_lc.contains(k.to_lowercase().as_str()))
}
