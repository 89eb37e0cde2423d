//! Output shapes for the old/new system comparison.

use crate::types::match_record::MatchedProduct;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How one index-paired record compares across the two systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOutcome {
    /// Both matched, same product fields.
    AgreeMatched,
    /// Both matched, at least one product field differs.
    Differ,
    /// Only the current system matched.
    OldOnly,
    /// Only the new system matched.
    NewOnly,
    /// Neither system matched.
    BothUnmatched,
}

/// One pair where both systems matched but disagreed on the product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedDifference {
    pub record_index: usize,
    pub input_text: String,
    pub old_match: MatchedProduct,
    pub new_match: MatchedProduct,
    /// `<old>_to_<new>` when the match_type changed, absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type_transition: Option<String>,
    pub changed_fields: Vec<String>,
}

/// Product-field change tallies over the differing pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldChanges {
    pub brand: usize,
    pub model: usize,
    pub fiber: usize,
}

/// Raw outcome counts for one comparison run.
///
/// The five outcome counts always sum to `total_records`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_records: usize,
    pub matching_results: usize,
    pub different_results: usize,
    pub old_only_matches: usize,
    pub new_only_matches: usize,
    pub both_unmatched: usize,
    /// Histogram of `<old>_to_<new>` match_type transitions over differing pairs.
    pub match_type_changes: BTreeMap<String, usize>,
    pub field_changes: FieldChanges,
}

/// Full result of comparing two parallel runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub summary: ComparisonSummary,
    /// Differing pairs in input order, capped at a fixed limit.
    pub detailed_differences: Vec<DetailedDifference>,
}

/// Counts restated as percentages of `total_records`, for humans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_records: usize,
    pub matching_results: usize,
    pub matching_pct: f64,
    pub different_results: usize,
    pub different_pct: f64,
    pub old_only_matches: usize,
    pub old_only_pct: f64,
    pub new_only_matches: usize,
    pub new_only_pct: f64,
    pub both_unmatched: usize,
    pub both_unmatched_pct: f64,
}

/// Shareable report document: percentage summary plus a bounded preview
/// of the differences. `total_differences` is the true count even when
/// the preview is truncated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub summary: ReportSummary,
    pub match_type_changes: BTreeMap<String, usize>,
    pub total_differences: usize,
    pub detailed_differences: Vec<DetailedDifference>,
}

/// Derived rates for a quick quality read of the new system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticalSummary {
    pub total_records: usize,
    /// Pairs where the systems ended up in the same place, matched or not.
    pub agreement_rate: f64,
    pub old_success_rate: f64,
    pub new_success_rate: f64,
    /// Most frequent match_type transition, with its count. Ties break
    /// to the lexicographically first key.
    pub most_common_transition: Option<MatchTypeTransition>,
    pub field_changes: FieldChanges,
}

/// One `<old>_to_<new>` transition and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTypeTransition {
    pub transition: String,
    pub count: usize,
}
