//! Learning reports over reviewer validation logs.
//!
//! Three stateless analyses over an injected batch of validation entries:
//! how each strategy performs, how each modifier performs, and what the
//! overridden inputs have in common. Reports are handed to the advisor
//! or read directly by an operator; nothing here persists state.

pub mod models;

pub use models::{
    CandidateModifier, LearningReport, ModifierPerformanceReport, ModifierStats,
    OverrideTallies, PatternDiscoveryReport, ReportStatus, ScoreDistribution,
    StrategyAnalysisReport, StrategyStats, SystemInfo,
};

use crate::types::validation::{ValidationAction, ValidationEntry};
use chrono::Utc;
use std::collections::BTreeMap;

/// Keywords in overridden inputs that hint at a missing modifier.
const OVERRIDE_KEYWORDS: &[&str] = &[
    "custom", "artisan", "handmade", "vintage", "restored", "resin",
];

/// Delimiters that often separate handle/knot descriptions, with the key
/// each one reports under.
const OVERRIDE_DELIMITERS: &[(&str, &str)] = &[
    ("/", "slash"),
    (" w/ ", "with_abbreviated"),
    (" with ", "with"),
    (" in ", "in"),
    (" - ", "dash"),
    (" + ", "plus"),
];

/// Starting weight for a discovered modifier before an operator tunes it.
const CANDIDATE_MODIFIER_WEIGHT: f64 = 10.0;

/// Occurrences needed before a keyword becomes a candidate modifier.
const CANDIDATE_MIN_OCCURRENCES: usize = 2;

/// Computes learning reports from one batch of validation entries.
pub struct LearningReportGenerator {
    entries: Vec<ValidationEntry>,
    system_info: SystemInfo,
}

#[derive(Default)]
struct StrategyAccum {
    total: usize,
    validated: usize,
    overridden: usize,
    score_sum: f64,
}

#[derive(Default)]
struct ModifierAccum {
    validated: usize,
    overridden: usize,
    value_sum: f64,
    occurrences: usize,
}

struct DistributionAccum {
    min: f64,
    max: f64,
    sum: f64,
    count: usize,
}

impl LearningReportGenerator {
    pub fn new(entries: Vec<ValidationEntry>) -> Self {
        Self::with_system_info(entries, SystemInfo::default())
    }

    pub fn with_system_info(entries: Vec<ValidationEntry>, system_info: SystemInfo) -> Self {
        Self {
            entries,
            system_info,
        }
    }

    /// Per-strategy selection tallies, score distributions, and who-chose-what
    /// tallies over the overridden entries.
    pub fn strategy_analysis(&self) -> LearningReport {
        let analysis_date = Utc::now().to_rfc3339();
        if self.entries.is_empty() {
            return LearningReport::StrategyAnalysis(StrategyAnalysisReport {
                status: ReportStatus::NoData,
                analysis_date,
                system_info: self.system_info.clone(),
                strategies: BTreeMap::new(),
                score_distributions: BTreeMap::new(),
                override_analysis: OverrideTallies::default(),
                warnings: Vec::new(),
            });
        }

        let mut accums: BTreeMap<String, StrategyAccum> = BTreeMap::new();
        let mut distributions: BTreeMap<String, DistributionAccum> = BTreeMap::new();
        let mut override_analysis = OverrideTallies::default();

        for entry in &self.entries {
            if let Some(choice) = &entry.system_choice {
                let accum = accums.entry(choice.strategy.clone()).or_default();
                accum.total += 1;
                accum.score_sum += choice.score;
                match entry.action {
                    Some(ValidationAction::Validated) => accum.validated += 1,
                    Some(ValidationAction::Overridden) => accum.overridden += 1,
                    None => {}
                }
            }

            for scored in &entry.all_strategies {
                // A strategy that never wins still gets a stats row.
                accums.entry(scored.strategy.clone()).or_default();
                let dist = distributions
                    .entry(scored.strategy.clone())
                    .or_insert(DistributionAccum {
                        min: f64::INFINITY,
                        max: f64::NEG_INFINITY,
                        sum: 0.0,
                        count: 0,
                    });
                dist.min = dist.min.min(scored.score);
                dist.max = dist.max.max(scored.score);
                dist.sum += scored.score;
                dist.count += 1;
            }

            if entry.action == Some(ValidationAction::Overridden) {
                if let Some(choice) = &entry.system_choice {
                    *override_analysis
                        .system_chosen
                        .entry(choice.strategy.clone())
                        .or_insert(0) += 1;
                }
                if let Some(user) = &entry.user_choice {
                    *override_analysis
                        .user_chosen
                        .entry(user.strategy.clone())
                        .or_insert(0) += 1;
                }
            }
        }

        let strategies = accums
            .into_iter()
            .map(|(name, accum)| {
                let total = accum.total as f64;
                let stats = StrategyStats {
                    total_selections: accum.total,
                    validated_selections: accum.validated,
                    overridden_selections: accum.overridden,
                    avg_score: if accum.total > 0 { accum.score_sum / total } else { 0.0 },
                    win_rate: if accum.total > 0 {
                        accum.validated as f64 / total * 100.0
                    } else {
                        0.0
                    },
                    loss_rate: if accum.total > 0 {
                        accum.overridden as f64 / total * 100.0
                    } else {
                        0.0
                    },
                };
                (name, stats)
            })
            .collect();

        let score_distributions = distributions
            .into_iter()
            .map(|(name, dist)| {
                let distribution = ScoreDistribution {
                    min: dist.min,
                    max: dist.max,
                    avg: dist.sum / dist.count as f64,
                    count: dist.count,
                };
                (name, distribution)
            })
            .collect();

        LearningReport::StrategyAnalysis(StrategyAnalysisReport {
            status: ReportStatus::Success,
            analysis_date,
            system_info: self.system_info.clone(),
            strategies,
            score_distributions,
            override_analysis,
            warnings: self.data_quality_warnings(),
        })
    }

    /// Validation outcome per modifier key, with coarse tuning hints.
    pub fn modifier_performance(&self) -> LearningReport {
        let analysis_date = Utc::now().to_rfc3339();
        if self.entries.is_empty() {
            return LearningReport::ModifierPerformance(ModifierPerformanceReport {
                status: ReportStatus::NoData,
                analysis_date,
                system_info: self.system_info.clone(),
                modifiers: BTreeMap::new(),
                warnings: Vec::new(),
            });
        }

        let mut accums: BTreeMap<String, ModifierAccum> = BTreeMap::new();
        for entry in &self.entries {
            let Some(choice) = &entry.system_choice else {
                continue;
            };
            for (name, value) in &choice.modifiers {
                let accum = accums.entry(name.clone()).or_default();
                accum.value_sum += value;
                accum.occurrences += 1;
                match entry.action {
                    Some(ValidationAction::Validated) => accum.validated += 1,
                    Some(ValidationAction::Overridden) => accum.overridden += 1,
                    None => {}
                }
            }
        }

        let modifiers = accums
            .into_iter()
            .map(|(name, accum)| {
                let judged = accum.validated + accum.overridden;
                let validation_rate = if judged > 0 {
                    accum.validated as f64 / judged as f64
                } else {
                    0.0
                };
                let recommendation = if validation_rate > 0.7 { "maintain" } else { "adjust" };
                let suggested_action = if validation_rate >= 0.8 {
                    Some("increase_weight".to_string())
                } else if validation_rate <= 0.5 {
                    Some("decrease_weight".to_string())
                } else {
                    None
                };
                let stats = ModifierStats {
                    validated: accum.validated,
                    overridden: accum.overridden,
                    avg_value: accum.value_sum / accum.occurrences as f64,
                    validation_rate,
                    recommendation: recommendation.to_string(),
                    suggested_action,
                };
                (name, stats)
            })
            .collect();

        LearningReport::ModifierPerformance(ModifierPerformanceReport {
            status: ReportStatus::Success,
            analysis_date,
            system_info: self.system_info.clone(),
            modifiers,
            warnings: self.data_quality_warnings(),
        })
    }

    /// What the overridden inputs share: keyword frequencies, candidate
    /// modifiers, and delimiter rates.
    pub fn pattern_discovery(&self) -> LearningReport {
        let analysis_date = Utc::now().to_rfc3339();
        if self.entries.is_empty() {
            return LearningReport::PatternDiscovery(PatternDiscoveryReport {
                status: ReportStatus::NoData,
                analysis_date,
                system_info: self.system_info.clone(),
                keyword_counts: BTreeMap::new(),
                candidate_modifiers: Vec::new(),
                delimiter_rates: BTreeMap::new(),
                overridden_total: 0,
                warnings: Vec::new(),
            });
        }

        let overridden: Vec<&ValidationEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.action == Some(ValidationAction::Overridden))
            .collect();
        let overridden_total = overridden.len();

        let contains_in_overridden = |needle: &str| -> usize {
            overridden
                .iter()
                .filter(|entry| {
                    entry
                        .input_text
                        .as_deref()
                        .is_some_and(|text| text.to_lowercase().contains(needle))
                })
                .count()
        };

        let mut keyword_counts = BTreeMap::new();
        for keyword in OVERRIDE_KEYWORDS {
            keyword_counts.insert(keyword.to_string(), contains_in_overridden(keyword));
        }

        let candidate_modifiers = keyword_counts
            .iter()
            .filter(|(_, &count)| count >= CANDIDATE_MIN_OCCURRENCES)
            .map(|(keyword, &count)| CandidateModifier {
                name: keyword.clone(),
                pattern: keyword.clone(),
                weight: CANDIDATE_MODIFIER_WEIGHT,
                occurrences: count,
            })
            .collect();

        let mut delimiter_rates = BTreeMap::new();
        for (delimiter, key) in OVERRIDE_DELIMITERS {
            let rate = if overridden_total > 0 {
                contains_in_overridden(delimiter) as f64 / overridden_total as f64
            } else {
                0.0
            };
            delimiter_rates.insert(key.to_string(), rate);
        }

        LearningReport::PatternDiscovery(PatternDiscoveryReport {
            status: ReportStatus::Success,
            analysis_date,
            system_info: self.system_info.clone(),
            keyword_counts,
            candidate_modifiers,
            delimiter_rates,
            overridden_total,
            warnings: self.data_quality_warnings(),
        })
    }

    /// Flag malformed entries without dropping them from the analyses.
    fn data_quality_warnings(&self) -> Vec<String> {
        let missing_input = self
            .entries
            .iter()
            .filter(|entry| entry.input_text.as_deref().map_or(true, |t| t.trim().is_empty()))
            .count();
        let missing_action = self.entries.iter().filter(|entry| entry.action.is_none()).count();

        let mut warnings = Vec::new();
        if missing_input > 0 {
            warnings.push(format!("{missing_input} entries missing input_text"));
        }
        if missing_action > 0 {
            warnings.push(format!("{missing_action} entries missing action"));
        }
        warnings
    }
}

#[cfg(test)]
#[path = "tests/learning_tests.rs"]
mod tests;
