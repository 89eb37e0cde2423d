//! Confidence heuristics for single match results.
//!
//! Scores how plausible one matcher decision looks given only the raw
//! input text, the resolved brand/model, and the match type. Pure and
//! deterministic; callers use it to flag records for human review.

use crate::types::match_record::{MatchRecord, MatchedProduct};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Makers that commonly show up in brush text next to someone else's handle.
const KNOWN_BRANDS: &[&str] = &[
    "Simpson",
    "Omega",
    "Semogue",
    "Zenith",
    "Declaration Grooming",
    "Chisel & Hound",
    "Maggard",
    "AP Shave Co",
    "Turn-N-Shave",
    "Oumo",
    "Dogwood",
    "Stirling",
    "Yaqi",
    "Paragon",
    "Summer Break",
];

/// Models too generic to identify a product on their own.
const GENERIC_MODELS: &[&str] = &["synthetic", "badger", "boar"];

/// Words that may precede a knot keyword without naming a maker.
const GENERIC_KNOT_WORDS: &[&str] = &[
    "knot", "shd", "badger", "boar", "synthetic", "best", "super", "pure", "finest", "premium",
    "two", "three", "band", "mixed", "white", "black", "brown", "high", "mountain", "the", "and",
    "with", "w", "in", "of", "by", "for", "from", "a", "an", "handle", "set", "brush",
];

/// Finish/model names that signal the text is more specific than a bare brand.
const SPECIFIC_MODEL_TOKENS: &[&str] = &[
    "chubby",
    "trafalgar",
    "tuxedo",
    "manchurian",
    "cashmere",
    "gelousy",
    "synbad",
    "odin",
    "washington",
    "jefferson",
    "franklin",
    "emillion",
    "sunrise",
];

/// Maker words directly before a knot keyword ("Oumo SHD", "Declaration badger").
static RE_KNOT_MAKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b([A-Za-z][A-Za-z&'.-]*(?:\s+[A-Za-z][A-Za-z&'.-]*){0,2})\s+(?:knot|shd|badger|boar|synthetic)\b",
    )
    .expect("Invalid regex")
});

/// Maker word directly before a knot-size token ("Oumo 26mm").
static RE_SIZE_MAKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([A-Za-z][A-Za-z&'.-]*)\s+(?:2[4-9]|30)\s*mm\b").expect("Invalid regex"));

/// Version markers like v2, B15, T3.
static RE_VERSION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[vbt]\d{1,2}\b").expect("Invalid regex"));

/// 4-5 digit catalog model numbers (Omega 10048 and friends).
static RE_MODEL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4,5}\b").expect("Invalid regex"));

const SCORE_MIN: i32 = 0;
const SCORE_MAX: i32 = 100;
const MISMATCH_THRESHOLD: i32 = 70;

/// Confidence band derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Outcome of scoring one match result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceAssessment {
    pub score: i32,
    pub level: ConfidenceLevel,
    /// Strong signals the match is wrong.
    pub issues: Vec<String>,
    /// Weaker signals worth a second look.
    pub warnings: Vec<String>,
    pub is_potential_mismatch: bool,
}

/// Score one match decision from its text evidence alone.
pub fn assess(
    original_text: &str,
    matched_brand: &str,
    matched_model: &str,
    match_type: &str,
) -> ConfidenceAssessment {
    let mut score: i32 = match match_type {
        "exact" => 95,
        "brand_default" => 60,
        _ => 40,
    };
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    let text_lower = original_text.to_lowercase();
    let brand_in_text = !matched_brand.is_empty() && text_lower.contains(&matched_brand.to_lowercase());

    if !brand_in_text && match_type != "brand_default" {
        score -= 20;
        issues.push(format!("brand '{matched_brand}' not found in original text"));
    }

    if let Some(other) = competing_brand(original_text, matched_brand) {
        score -= 30;
        issues.push(format!("text mentions competing maker '{other}'"));
    }

    if let Some(maker) = foreign_knot_maker(original_text, matched_brand) {
        score -= 25;
        issues.push(format!("knot maker '{maker}' differs from matched brand"));
    }

    if match_type == "brand_default" && GENERIC_MODELS.contains(&matched_model.to_lowercase().as_str()) {
        score -= 10;
        warnings.push(format!("generic model '{matched_model}' matched by brand default"));
    }

    if match_type == "brand_default" && has_specific_model_indicator(&text_lower) {
        score -= 15;
        warnings.push("brand default match but text names a specific model".to_string());
    }

    if match_type == "exact" && brand_in_text {
        score = (score + 10).min(SCORE_MAX);
    }

    let score = score.clamp(SCORE_MIN, SCORE_MAX);
    let level = if score >= 80 {
        ConfidenceLevel::High
    } else if score >= 60 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    ConfidenceAssessment {
        score,
        level,
        issues,
        warnings,
        is_potential_mismatch: score < MISMATCH_THRESHOLD,
    }
}

/// Run [`assess`] over a whole result set and keep the suspicious ones.
///
/// Unmatched records are skipped: there is no brand/model to judge.
/// Returns `(index, assessment)` pairs for every record scoring below the
/// mismatch threshold, in input order.
pub fn flag_potential_mismatches(records: &[MatchRecord]) -> Vec<(usize, ConfidenceAssessment)> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let MatchedProduct { brand, model, .. } = record.matched.as_ref()?;
            let match_type = record.match_type.as_deref().unwrap_or("unknown");
            let assessment = assess(&record.original_text, brand, model, match_type);
            assessment.is_potential_mismatch.then_some((index, assessment))
        })
        .collect()
}

/// Lowercase and strip separators so "Turn-N-Shave" and "turn n shave" compare equal.
fn normalize_identity(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-'))
        .collect()
}

/// First roster brand present in the text under a different identity than `matched_brand`.
fn competing_brand(text: &str, matched_brand: &str) -> Option<String> {
    let text_id = normalize_identity(text);
    let brand_id = normalize_identity(matched_brand);

    KNOWN_BRANDS
        .iter()
        .find(|known| {
            let known_id = normalize_identity(known);
            let same_maker = !brand_id.is_empty()
                && (brand_id.contains(&known_id) || known_id.contains(&brand_id));
            !same_maker && text_id.contains(&known_id)
        })
        .map(|known| known.to_string())
}

/// First maker candidate near a knot keyword or size token that is not the matched brand.
fn foreign_knot_maker(text: &str, matched_brand: &str) -> Option<String> {
    let brand_id = normalize_identity(matched_brand);

    for re in [&*RE_KNOT_MAKER, &*RE_SIZE_MAKER] {
        for caps in re.captures_iter(text) {
            // Keep only the maker-like suffix nearest the keyword; the greedy
            // capture often drags in filler like "handle with".
            let mut kept: Vec<&str> = caps[1]
                .split_whitespace()
                .rev()
                .take_while(|word| !GENERIC_KNOT_WORDS.contains(&word.to_lowercase().as_str()))
                .collect();
            kept.reverse();
            if kept.is_empty() {
                continue;
            }

            let candidate = title_case(&kept.join(" "));
            let candidate_id = normalize_identity(&candidate);
            let same_maker = !brand_id.is_empty()
                && (brand_id.contains(&candidate_id) || candidate_id.contains(&brand_id));
            if candidate_id.is_empty() || same_maker {
                continue;
            }
            return Some(candidate);
        }
    }
    None
}

fn has_specific_model_indicator(text_lower: &str) -> bool {
    SPECIFIC_MODEL_TOKENS.iter().any(|token| text_lower.contains(token))
        || RE_VERSION_MARKER.is_match(text_lower)
        || RE_MODEL_NUMBER.is_match(text_lower)
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
#[path = "tests/confidence_tests.rs"]
mod tests;
