//! Report shapes produced by the learning report generator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a report was computed from data or from an empty batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    NoData,
}

/// Identity block stamped on every report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub system_type: String,
    pub version: String,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            system_type: "brush_scoring".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Selection and validation tallies for one strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyStats {
    pub total_selections: usize,
    pub validated_selections: usize,
    pub overridden_selections: usize,
    /// Average winning score when this strategy was chosen.
    pub avg_score: f64,
    /// validated / total x 100.
    pub win_rate: f64,
    /// overridden / total x 100.
    pub loss_rate: f64,
}

/// Score spread one strategy produced across all inputs it scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDistribution {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
}

/// Who picked what when the reviewer overrode the system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideTallies {
    pub system_chosen: BTreeMap<String, usize>,
    pub user_chosen: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAnalysisReport {
    pub status: ReportStatus,
    pub analysis_date: String,
    pub system_info: SystemInfo,
    pub strategies: BTreeMap<String, StrategyStats>,
    pub score_distributions: BTreeMap<String, ScoreDistribution>,
    pub override_analysis: OverrideTallies,
    pub warnings: Vec<String>,
}

/// Validation outcome tallies for one modifier key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierStats {
    pub validated: usize,
    pub overridden: usize,
    /// Average applied modifier value across all occurrences.
    pub avg_value: f64,
    /// validated / (validated + overridden); 0 when never judged.
    pub validation_rate: f64,
    /// "maintain" above 0.7, "adjust" otherwise.
    pub recommendation: String,
    /// "increase_weight" at >= 0.8, "decrease_weight" at <= 0.5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierPerformanceReport {
    pub status: ReportStatus,
    pub analysis_date: String,
    pub system_info: SystemInfo,
    pub modifiers: BTreeMap<String, ModifierStats>,
    pub warnings: Vec<String>,
}

/// A keyword frequent enough in overridden inputs to deserve its own modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateModifier {
    pub name: String,
    pub pattern: String,
    pub weight: f64,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDiscoveryReport {
    pub status: ReportStatus,
    pub analysis_date: String,
    pub system_info: SystemInfo,
    /// Overridden entries containing each vocabulary keyword.
    pub keyword_counts: BTreeMap<String, usize>,
    pub candidate_modifiers: Vec<CandidateModifier>,
    /// Overridden entries containing each delimiter, as a fraction of all
    /// overridden entries.
    pub delimiter_rates: BTreeMap<String, f64>,
    pub overridden_total: usize,
    pub warnings: Vec<String>,
}

/// One of the three learning reports, tagged for downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "report_type", rename_all = "snake_case")]
pub enum LearningReport {
    StrategyAnalysis(StrategyAnalysisReport),
    ModifierPerformance(ModifierPerformanceReport),
    PatternDiscovery(PatternDiscoveryReport),
}

impl LearningReport {
    pub fn status(&self) -> ReportStatus {
        match self {
            LearningReport::StrategyAnalysis(report) => report.status,
            LearningReport::ModifierPerformance(report) => report.status,
            LearningReport::PatternDiscovery(report) => report.status,
        }
    }

    pub fn system_info(&self) -> &SystemInfo {
        match self {
            LearningReport::StrategyAnalysis(report) => &report.system_info,
            LearningReport::ModifierPerformance(report) => &report.system_info,
            LearningReport::PatternDiscovery(report) => &report.system_info,
        }
    }
}
