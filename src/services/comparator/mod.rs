//! Index-paired comparison of two matcher runs over the same month.
//!
//! The runs correlate by position only, so a length mismatch is fatal.
//! Everything downstream (report, statistics) derives from one pass over
//! the pairs.

pub mod types;

pub use types::{
    Comparison, ComparisonOutcome, ComparisonReport, ComparisonSummary, DetailedDifference,
    FieldChanges, MatchTypeTransition, ReportSummary, StatisticalSummary,
};

use crate::types::errors::{TuningError, TuningResult};
use crate::types::match_record::MatchRecord;
use std::path::Path;

/// Hard cap on stored differing pairs; counting continues past it.
pub const MAX_DETAILED_DIFFERENCES: usize = 500;

/// Differences included verbatim in a generated report.
pub const DIFFERENCE_PREVIEW_LIMIT: usize = 20;

/// Compare two runs record-by-record. Inputs must be the same length
/// and the same input order; there is no other correlation key.
pub fn compare(old: &[MatchRecord], new: &[MatchRecord]) -> TuningResult<Comparison> {
    if old.len() != new.len() {
        return Err(TuningError::RecordCountMismatch {
            old: old.len(),
            new: new.len(),
        });
    }

    let mut summary = ComparisonSummary {
        total_records: old.len(),
        ..ComparisonSummary::default()
    };
    let mut detailed_differences = Vec::new();

    for (index, (old_record, new_record)) in old.iter().zip(new.iter()).enumerate() {
        match classify(old_record, new_record) {
            ComparisonOutcome::AgreeMatched => summary.matching_results += 1,
            ComparisonOutcome::OldOnly => summary.old_only_matches += 1,
            ComparisonOutcome::NewOnly => summary.new_only_matches += 1,
            ComparisonOutcome::BothUnmatched => summary.both_unmatched += 1,
            ComparisonOutcome::Differ => {
                summary.different_results += 1;
                record_difference(
                    &mut summary,
                    &mut detailed_differences,
                    index,
                    old_record,
                    new_record,
                );
            }
        }
    }

    log::info!(
        "Compared {} records: {} agree, {} differ, {} old-only, {} new-only, {} unmatched",
        summary.total_records,
        summary.matching_results,
        summary.different_results,
        summary.old_only_matches,
        summary.new_only_matches,
        summary.both_unmatched
    );

    Ok(Comparison {
        summary,
        detailed_differences,
    })
}

/// Classify one index pair by match presence and product-field equality.
pub fn classify(old: &MatchRecord, new: &MatchRecord) -> ComparisonOutcome {
    match (&old.matched, &new.matched) {
        (Some(old_product), Some(new_product)) => {
            if old_product.changed_fields(new_product).is_empty() {
                ComparisonOutcome::AgreeMatched
            } else {
                ComparisonOutcome::Differ
            }
        }
        (Some(_), None) => ComparisonOutcome::OldOnly,
        (None, Some(_)) => ComparisonOutcome::NewOnly,
        (None, None) => ComparisonOutcome::BothUnmatched,
    }
}

fn record_difference(
    summary: &mut ComparisonSummary,
    detailed_differences: &mut Vec<DetailedDifference>,
    index: usize,
    old_record: &MatchRecord,
    new_record: &MatchRecord,
) {
    // Classification guarantees both sides are matched here.
    let (Some(old_product), Some(new_product)) = (&old_record.matched, &new_record.matched) else {
        return;
    };

    let changed_fields = old_product.changed_fields(new_product);
    for field in &changed_fields {
        match field.as_str() {
            "brand" => summary.field_changes.brand += 1,
            "model" => summary.field_changes.model += 1,
            "fiber" => summary.field_changes.fiber += 1,
            _ => {}
        }
    }

    let match_type_transition = if old_record.match_type != new_record.match_type {
        let transition = format!(
            "{}_to_{}",
            old_record.match_type.as_deref().unwrap_or("unknown"),
            new_record.match_type.as_deref().unwrap_or("unknown")
        );
        *summary.match_type_changes.entry(transition.clone()).or_insert(0) += 1;
        Some(transition)
    } else {
        None
    };

    if detailed_differences.len() < MAX_DETAILED_DIFFERENCES {
        detailed_differences.push(DetailedDifference {
            record_index: index,
            input_text: old_record.original_text.clone(),
            old_match: old_product.clone(),
            new_match: new_product.clone(),
            match_type_transition,
            changed_fields,
        });
    }
}

impl Comparison {
    /// Human-oriented report: percentages plus a truncated difference preview.
    pub fn generate_report(&self) -> ComparisonReport {
        let summary = &self.summary;
        let total = summary.total_records;

        ComparisonReport {
            summary: ReportSummary {
                total_records: total,
                matching_results: summary.matching_results,
                matching_pct: pct(summary.matching_results, total),
                different_results: summary.different_results,
                different_pct: pct(summary.different_results, total),
                old_only_matches: summary.old_only_matches,
                old_only_pct: pct(summary.old_only_matches, total),
                new_only_matches: summary.new_only_matches,
                new_only_pct: pct(summary.new_only_matches, total),
                both_unmatched: summary.both_unmatched,
                both_unmatched_pct: pct(summary.both_unmatched, total),
            },
            match_type_changes: summary.match_type_changes.clone(),
            total_differences: summary.different_results,
            detailed_differences: self
                .detailed_differences
                .iter()
                .take(DIFFERENCE_PREVIEW_LIMIT)
                .cloned()
                .collect(),
        }
    }

    /// Aggregate rates for deciding whether the new system is an upgrade.
    pub fn statistical_summary(&self) -> StatisticalSummary {
        let summary = &self.summary;
        let total = summary.total_records;

        let most_common_transition = summary
            .match_type_changes
            .iter()
            .fold(None::<MatchTypeTransition>, |best, (transition, &count)| {
                match best {
                    // Strict greater keeps the lexicographically first key on ties.
                    Some(ref current) if count <= current.count => best,
                    _ => Some(MatchTypeTransition {
                        transition: transition.clone(),
                        count,
                    }),
                }
            });

        StatisticalSummary {
            total_records: total,
            agreement_rate: rate(summary.matching_results + summary.both_unmatched, total),
            old_success_rate: rate(summary.matching_results + summary.old_only_matches, total),
            new_success_rate: rate(summary.matching_results + summary.new_only_matches, total),
            most_common_transition,
            field_changes: summary.field_changes.clone(),
        }
    }

    /// Write the generated report as pretty JSON, creating parent directories.
    pub fn write_report(&self, path: &Path) -> TuningResult<()> {
        let report = self.generate_report();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TuningError::Io(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let pretty = serde_json::to_string_pretty(&report)
            .map_err(|e| TuningError::Parse(format!("failed to serialize report: {e}")))?;
        std::fs::write(path, pretty)
            .map_err(|e| TuningError::Io(format!("failed to write {}: {e}", path.display())))?;

        log::info!("Wrote comparison report to {}", path.display());
        Ok(())
    }
}

/// Percentage of `total`, rounded to two decimals. Zero when `total` is zero.
fn pct(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 10_000.0).round() / 100.0
}

/// Plain fraction of `total`. Zero when `total` is zero.
fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}

#[cfg(test)]
#[path = "tests/comparator_tests.rs"]
mod tests;
