//! External advisor over learning reports.
//!
//! Wraps an untrusted suggestion service: transport failures, service
//! errors, and malformed replies all come back as typed errors, never
//! panics. Without a credential the analyzer runs in declared mock mode
//! so the tuning loop stays runnable end-to-end.

pub mod prompt;
pub mod provider;

pub use provider::{HttpSuggestionProvider, SuggestionProvider};

use crate::services::learning::{LearningReport, ReportStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Env vars checked for the advisor credential, in order.
const API_KEY_VARS: &[&str] = &["BRUSHTUNE_ADVISOR_API_KEY", "OPENAI_API_KEY"];

/// Which learning report a suggestion or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    StrategyAnalysis,
    ModifierPerformance,
    PatternDiscovery,
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnalysisType::StrategyAnalysis => "strategy_analysis",
            AnalysisType::ModifierPerformance => "modifier_performance",
            AnalysisType::PatternDiscovery => "pattern_discovery",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("{0} report has no data to analyze")]
    EmptyReport(AnalysisType),
    #[error("suggestion service failed for {analysis_type}: {message}")]
    Service {
        analysis_type: AnalysisType,
        message: String,
    },
    #[error("invalid response format for {analysis_type}")]
    InvalidResponse {
        analysis_type: AnalysisType,
        raw_response: String,
    },
}

/// Parsed advisor reply. Untrusted until the configuration updater
/// validates every value in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorSuggestion {
    pub analysis_type: AnalysisType,
    /// strategy -> proposed base weight.
    #[serde(default)]
    pub weight_adjustments: BTreeMap<String, f64>,
    /// modifier -> proposed value.
    #[serde(default)]
    pub modifier_adjustments: BTreeMap<String, f64>,
    #[serde(default)]
    pub suggested_new_modifiers: Vec<SuggestedModifier>,
    pub reasoning: String,
    /// Set when the suggestion was produced without consulting the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// A brand-new modifier the advisor wants added to the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedModifier {
    pub name: String,
    #[serde(default)]
    pub pattern: String,
    /// strategy -> weight to install the modifier at.
    #[serde(default)]
    pub suggested_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub test_cases: Vec<String>,
}

/// Service reply in its loosest acceptable form; anything missing
/// defaults instead of failing.
#[derive(Debug, Default, Deserialize)]
struct SuggestionPayload {
    #[serde(default)]
    weight_adjustments: BTreeMap<String, f64>,
    #[serde(default)]
    modifier_adjustments: BTreeMap<String, f64>,
    #[serde(default)]
    suggested_new_modifiers: Vec<SuggestedModifier>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Sends learning reports to the suggestion service and parses the replies.
pub struct AdvisorAnalyzer {
    provider: Option<Box<dyn SuggestionProvider>>,
}

impl AdvisorAnalyzer {
    /// Build from the environment. Falls back to mock mode when no
    /// credential is configured, so callers never need network access.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // Try to load .env, ignore if missing
        for var in API_KEY_VARS {
            if let Ok(key) = std::env::var(var) {
                if !key.trim().is_empty() {
                    return Self {
                        provider: Some(Box::new(HttpSuggestionProvider::new(key, None))),
                    };
                }
            }
        }

        log::warn!("No advisor API key configured; running in mock mode");
        Self { provider: None }
    }

    pub fn with_provider(provider: Box<dyn SuggestionProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Mock mode: analyze() answers with warning-tagged empty suggestions
    /// and never touches the network.
    pub fn mock() -> Self {
        Self { provider: None }
    }

    pub fn is_mock(&self) -> bool {
        self.provider.is_none()
    }

    /// Ask the service what to change based on one learning report.
    pub fn analyze(&self, report: &LearningReport) -> Result<AdvisorSuggestion, AdvisorError> {
        let analysis_type = analysis_type_of(report);

        if report.status() == ReportStatus::NoData || primary_section_empty(report) {
            return Err(AdvisorError::EmptyReport(analysis_type));
        }

        let Some(provider) = &self.provider else {
            log::info!("Advisor mock mode: empty suggestion for {analysis_type}");
            return Ok(AdvisorSuggestion {
                analysis_type,
                weight_adjustments: BTreeMap::new(),
                modifier_adjustments: BTreeMap::new(),
                suggested_new_modifiers: Vec::new(),
                reasoning: "no reasoning provided".to_string(),
                warning: Some("mock mode: no API key configured".to_string()),
            });
        };

        let prompt = prompt::build_prompt(report);
        let raw = provider.suggest(&prompt).map_err(|message| {
            log::error!("Suggestion service failed for {analysis_type}: {message}");
            AdvisorError::Service {
                analysis_type,
                message,
            }
        })?;

        let payload: SuggestionPayload =
            serde_json::from_str(raw.trim()).map_err(|_| AdvisorError::InvalidResponse {
                analysis_type,
                raw_response: raw.clone(),
            })?;

        Ok(AdvisorSuggestion {
            analysis_type,
            weight_adjustments: payload.weight_adjustments,
            modifier_adjustments: payload.modifier_adjustments,
            suggested_new_modifiers: payload.suggested_new_modifiers,
            reasoning: payload
                .reasoning
                .filter(|reasoning| !reasoning.trim().is_empty())
                .unwrap_or_else(|| "no reasoning provided".to_string()),
            warning: None,
        })
    }
}

fn analysis_type_of(report: &LearningReport) -> AnalysisType {
    match report {
        LearningReport::StrategyAnalysis(_) => AnalysisType::StrategyAnalysis,
        LearningReport::ModifierPerformance(_) => AnalysisType::ModifierPerformance,
        LearningReport::PatternDiscovery(_) => AnalysisType::PatternDiscovery,
    }
}

/// A Success-status report can still carry nothing to advise on.
fn primary_section_empty(report: &LearningReport) -> bool {
    match report {
        LearningReport::StrategyAnalysis(report) => report.strategies.is_empty(),
        LearningReport::ModifierPerformance(report) => report.modifiers.is_empty(),
        LearningReport::PatternDiscovery(report) => report.keyword_counts.is_empty(),
    }
}

#[cfg(test)]
#[path = "tests/advisor_tests.rs"]
mod tests;
