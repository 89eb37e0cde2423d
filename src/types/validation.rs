//! Reviewer validation log entries consumed by the learning report generator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What the reviewer did with the system's pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationAction {
    /// Reviewer accepted the system's choice as-is.
    Validated,
    /// Reviewer replaced the system's choice with their own.
    Overridden,
}

/// The strategy the system selected for an input, with its winning score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemChoice {
    pub strategy: String,
    pub score: f64,
    /// Modifier name -> value applied on top of the base strategy weight.
    #[serde(default)]
    pub modifiers: BTreeMap<String, f64>,
}

/// The strategy the reviewer picked when overriding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserChoice {
    pub strategy: String,
}

/// Score a non-winning strategy produced for the same input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyScore {
    pub strategy: String,
    pub score: f64,
}

/// One line of the validation log. All fields are lenient: real logs
/// contain partial entries and the report generator must not die on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationEntry {
    #[serde(default)]
    pub input_text: Option<String>,
    #[serde(default)]
    pub action: Option<ValidationAction>,
    #[serde(default)]
    pub system_choice: Option<SystemChoice>,
    #[serde(default)]
    pub user_choice: Option<UserChoice>,
    /// Every strategy that scored this input, winner included.
    #[serde(default)]
    pub all_strategies: Vec<StrategyScore>,
}

impl ValidationEntry {
    /// An entry is usable for analysis when it names its input and action.
    pub fn has_required_fields(&self) -> bool {
        self.input_text.as_deref().is_some_and(|t| !t.trim().is_empty()) && self.action.is_some()
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
