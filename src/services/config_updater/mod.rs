//! Transactional updates to the brush scoring configuration file.
//!
//! Every mutation re-reads the TOML document from disk and writes back
//! through a temp-file rename. Advisor-driven transactions take a
//! timestamped backup first and restore it when a step fails.

pub mod document;

use crate::services::advisor::{AdvisorSuggestion, SuggestedModifier};
use crate::services::config_updater::document::{extract_preamble, write_atomic};
use crate::types::errors::{TuningError, TuningResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Base strategy weights must stay within this range.
pub const MIN_BASE_WEIGHT: f64 = 0.0;
pub const MAX_BASE_WEIGHT: f64 = 1000.0;

const BACKUP_DIR_NAME: &str = "backups";
/// Fixed-width UTC timestamp, so backup names sort chronologically.
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%9f";

/// On-disk shape of the scoring configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub brush_scoring_weights: ScoringWeights,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight per matching strategy, keyed by strategy name.
    #[serde(default)]
    pub base_strategies: BTreeMap<String, f64>,
    /// Per-strategy modifier weights, keyed by strategy then modifier name.
    #[serde(default)]
    pub strategy_modifiers: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Result of a single adjustment step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepOutcome {
    /// Number of individual weight slots updated.
    pub applied: usize,
    pub warnings: Vec<String>,
}

/// Outcome of a full advisor-driven update transaction.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub success: bool,
    pub rolled_back: bool,
    pub backup_path: Option<PathBuf>,
    pub weights_applied: usize,
    pub modifiers_applied: usize,
    pub new_modifiers_applied: usize,
    pub warnings: Vec<String>,
}

/// One entry of a dry-run diff against the current configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedChange {
    /// Dotted path of the affected value, e.g. `base_strategies.known_brush`.
    pub target: String,
    pub old: Option<f64>,
    pub new: f64,
    /// Whether the real update would accept this change.
    pub applies: bool,
}

/// Checks a scoring configuration for structural problems.
///
/// An empty result means the configuration is valid.
pub fn validation_issues(config: &ScoringConfig) -> Vec<String> {
    let mut issues = Vec::new();
    let weights = &config.brush_scoring_weights;

    if weights.base_strategies.is_empty() {
        issues.push("base_strategies is empty".to_string());
    }
    for (strategy, &weight) in &weights.base_strategies {
        if !is_valid_base_weight(weight) {
            issues.push(format!(
                "strategy '{strategy}' has weight {weight}, expected a finite value in [{MIN_BASE_WEIGHT}, {MAX_BASE_WEIGHT}]"
            ));
        }
    }
    for (strategy, modifiers) in &weights.strategy_modifiers {
        for (modifier, &value) in modifiers {
            if !value.is_finite() {
                issues.push(format!(
                    "modifier '{modifier}' under '{strategy}' has non-finite value {value}"
                ));
            }
        }
    }
    issues
}

fn is_valid_base_weight(weight: f64) -> bool {
    weight.is_finite() && (MIN_BASE_WEIGHT..=MAX_BASE_WEIGHT).contains(&weight)
}

/// Applies advisor suggestions to the scoring configuration file.
///
/// Holds no parsed state; every operation re-reads the file from disk.
pub struct ConfigUpdater {
    config_path: PathBuf,
}

impl ConfigUpdater {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Reads and parses the scoring configuration from disk.
    pub fn load_configuration(&self) -> TuningResult<ScoringConfig> {
        let raw = self.read_raw()?;
        toml::from_str(&raw).map_err(|e| {
            TuningError::Parse(format!(
                "Failed to parse {}: {e}",
                self.config_path.display()
            ))
        })
    }

    /// Serializes `config` back to disk, keeping the leading comment block
    /// of the existing file.
    pub fn save_configuration(&self, config: &ScoringConfig) -> TuningResult<()> {
        let preamble = match fs::read_to_string(&self.config_path) {
            Ok(raw) => extract_preamble(&raw),
            Err(_) => String::new(),
        };
        let body = toml::to_string_pretty(config).map_err(|e| {
            TuningError::Parse(format!("Failed to serialize scoring config: {e}"))
        })?;

        let mut output = preamble;
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&body);
        write_atomic(&self.config_path, output)
    }

    /// Copies the current config, byte for byte, into the `backups/`
    /// directory next to it. Backups are never deleted.
    pub fn create_backup(&self) -> TuningResult<PathBuf> {
        let bytes = fs::read(&self.config_path).map_err(|e| {
            TuningError::Io(format!("Failed to read {}: {e}", self.config_path.display()))
        })?;

        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir)
            .map_err(|e| TuningError::Io(format!("Failed to create backup directory: {e}")))?;

        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let backup_path = backup_dir.join(format!("{}.{timestamp}.bak", self.config_stem()?));
        fs::write(&backup_path, bytes)
            .map_err(|e| TuningError::Io(format!("Failed to write backup file: {e}")))?;

        log::info!("Backed up scoring config to {}", backup_path.display());
        Ok(backup_path)
    }

    /// Lists backups of this config file, oldest first.
    pub fn list_backups(&self) -> TuningResult<Vec<PathBuf>> {
        let backup_dir = self.backup_dir();
        if !backup_dir.is_dir() {
            return Ok(Vec::new());
        }

        let prefix = format!("{}.", self.config_stem()?);
        let entries = fs::read_dir(&backup_dir)
            .map_err(|e| TuningError::Io(format!("Failed to read backup directory: {e}")))?;

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| TuningError::Io(format!("Failed to read backup directory: {e}")))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // Only "<stem>.<timestamp>.bak" counts; a sibling config sharing
            // the stem prefix must not cross-match.
            let is_own_backup = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".bak"))
                .is_some_and(|stamp| !stamp.is_empty() && stamp.bytes().all(|b| b.is_ascii_digit()));
            if is_own_backup {
                backups.push(path);
            }
        }
        backups.sort();
        Ok(backups)
    }

    /// Restores the most recent backup over the config file. Returns the
    /// backup used, or `None` when no backups exist.
    pub fn rollback_to_latest_backup(&self) -> TuningResult<Option<PathBuf>> {
        let backups = self.list_backups()?;
        let Some(latest) = backups.last() else {
            return Ok(None);
        };

        let bytes = fs::read(latest)
            .map_err(|e| TuningError::Io(format!("Failed to read backup file: {e}")))?;
        write_atomic(&self.config_path, bytes)?;
        log::info!("Rolled back scoring config from {}", latest.display());
        Ok(Some(latest.clone()))
    }

    /// Applies base-strategy weight adjustments.
    ///
    /// Unknown strategies and out-of-range values are skipped with warnings;
    /// strategies are never created here. Fails without writing when every
    /// suggested value is invalid.
    pub fn apply_weight_adjustments(
        &self,
        adjustments: &BTreeMap<String, f64>,
    ) -> TuningResult<StepOutcome> {
        let mut config = self.load_configuration()?;
        let mut outcome = StepOutcome::default();
        let mut invalid = 0usize;

        for (strategy, &weight) in adjustments {
            if !is_valid_base_weight(weight) {
                invalid += 1;
                outcome.warnings.push(format!(
                    "invalid weight {weight} for strategy '{strategy}': expected a finite value in [{MIN_BASE_WEIGHT}, {MAX_BASE_WEIGHT}]"
                ));
                continue;
            }
            match config
                .brush_scoring_weights
                .base_strategies
                .get_mut(strategy)
            {
                Some(current) => {
                    *current = weight;
                    outcome.applied += 1;
                }
                None => {
                    outcome.warnings.push(format!(
                        "unknown strategy '{strategy}': not present in base_strategies, skipped"
                    ));
                }
            }
        }

        if !adjustments.is_empty() && invalid == adjustments.len() {
            return Err(TuningError::InvalidConfig(
                "all suggested weight adjustments are invalid".to_string(),
            ));
        }
        if outcome.applied > 0 {
            self.save_configuration(&config)?;
        }
        Ok(outcome)
    }

    /// Applies modifier weight adjustments, broadcast to every strategy that
    /// declares the modifier. Modifier values may be negative.
    pub fn apply_modifier_adjustments(
        &self,
        adjustments: &BTreeMap<String, f64>,
    ) -> TuningResult<StepOutcome> {
        let mut config = self.load_configuration()?;
        let mut outcome = StepOutcome::default();
        let mut invalid = 0usize;

        for (modifier, &value) in adjustments {
            if !value.is_finite() {
                invalid += 1;
                outcome.warnings.push(format!(
                    "invalid value {value} for modifier '{modifier}': expected a finite number"
                ));
                continue;
            }
            let mut updated = 0usize;
            for modifiers in config.brush_scoring_weights.strategy_modifiers.values_mut() {
                if let Some(current) = modifiers.get_mut(modifier) {
                    *current = value;
                    updated += 1;
                }
            }
            if updated == 0 {
                outcome.warnings.push(format!(
                    "modifier '{modifier}' is not declared by any strategy, skipped"
                ));
            } else {
                outcome.applied += updated;
            }
        }

        if !adjustments.is_empty() && invalid == adjustments.len() {
            return Err(TuningError::InvalidConfig(
                "all suggested modifier adjustments are invalid".to_string(),
            ));
        }
        if outcome.applied > 0 {
            self.save_configuration(&config)?;
        }
        Ok(outcome)
    }

    /// Adds advisor-suggested modifiers under each strategy they name.
    /// An existing modifier with the same name is overwritten.
    pub fn apply_new_modifiers(
        &self,
        suggestions: &[SuggestedModifier],
    ) -> TuningResult<StepOutcome> {
        let mut config = self.load_configuration()?;
        let mut outcome = StepOutcome::default();

        for suggestion in suggestions {
            for (strategy, &weight) in &suggestion.suggested_weights {
                if !weight.is_finite() {
                    outcome.warnings.push(format!(
                        "invalid weight {weight} for new modifier '{}' under '{strategy}'",
                        suggestion.name
                    ));
                    continue;
                }
                if !config
                    .brush_scoring_weights
                    .base_strategies
                    .contains_key(strategy)
                {
                    outcome.warnings.push(format!(
                        "new modifier '{}' targets unknown strategy '{strategy}', skipped",
                        suggestion.name
                    ));
                    continue;
                }
                config
                    .brush_scoring_weights
                    .strategy_modifiers
                    .entry(strategy.clone())
                    .or_default()
                    .insert(suggestion.name.clone(), weight);
                outcome.applied += 1;
            }
        }

        if outcome.applied > 0 {
            self.save_configuration(&config)?;
        }
        Ok(outcome)
    }

    /// Applies a full advisor suggestion as a transaction.
    ///
    /// A backup is taken first; then weight, modifier, and new-modifier steps
    /// run in order. Any step failure, or a resulting config that fails
    /// validation, restores that backup and reports `rolled_back`.
    pub fn apply_advisor_suggestions(
        &self,
        suggestion: &AdvisorSuggestion,
    ) -> TuningResult<UpdateOutcome> {
        let backup_path = self.create_backup()?;
        log::info!(
            "Applying {} suggestion to {}",
            suggestion.analysis_type,
            self.config_path.display()
        );

        let mut outcome = UpdateOutcome {
            success: false,
            rolled_back: false,
            backup_path: Some(backup_path),
            weights_applied: 0,
            modifiers_applied: 0,
            new_modifiers_applied: 0,
            warnings: Vec::new(),
        };

        if let Err(e) = self.apply_all_steps(suggestion, &mut outcome) {
            log::error!("Suggestion application failed, rolling back: {e}");
            self.rollback_to_latest_backup()?;
            outcome.rolled_back = true;
            outcome
                .warnings
                .push(format!("update failed and was rolled back: {e}"));
            return Ok(outcome);
        }

        let updated = self.load_configuration()?;
        let issues = validation_issues(&updated);
        if !issues.is_empty() {
            log::error!(
                "Updated config failed validation, rolling back: {}",
                issues.join("; ")
            );
            self.rollback_to_latest_backup()?;
            outcome.rolled_back = true;
            outcome.warnings.extend(issues);
            outcome
                .warnings
                .push("update failed validation and was rolled back".to_string());
            return Ok(outcome);
        }

        outcome.success = true;
        log::info!(
            "Applied suggestion: {} weights, {} modifiers, {} new modifiers",
            outcome.weights_applied,
            outcome.modifiers_applied,
            outcome.new_modifiers_applied
        );
        Ok(outcome)
    }

    /// Computes the changes a suggestion would make, without writing.
    pub fn preview_changes(
        &self,
        suggestion: &AdvisorSuggestion,
    ) -> TuningResult<Vec<PlannedChange>> {
        let config = self.load_configuration()?;
        let weights = &config.brush_scoring_weights;
        let mut changes = Vec::new();

        for (strategy, &weight) in &suggestion.weight_adjustments {
            let old = weights.base_strategies.get(strategy).copied();
            changes.push(PlannedChange {
                target: format!("base_strategies.{strategy}"),
                old,
                new: weight,
                applies: is_valid_base_weight(weight) && old.is_some(),
            });
        }

        for (modifier, &value) in &suggestion.modifier_adjustments {
            let mut declared = false;
            for (strategy, modifiers) in &weights.strategy_modifiers {
                if let Some(&old) = modifiers.get(modifier) {
                    declared = true;
                    changes.push(PlannedChange {
                        target: format!("strategy_modifiers.{strategy}.{modifier}"),
                        old: Some(old),
                        new: value,
                        applies: value.is_finite(),
                    });
                }
            }
            if !declared {
                changes.push(PlannedChange {
                    target: format!("strategy_modifiers.*.{modifier}"),
                    old: None,
                    new: value,
                    applies: false,
                });
            }
        }

        for new_modifier in &suggestion.suggested_new_modifiers {
            for (strategy, &weight) in &new_modifier.suggested_weights {
                let old = weights
                    .strategy_modifiers
                    .get(strategy)
                    .and_then(|modifiers| modifiers.get(&new_modifier.name))
                    .copied();
                changes.push(PlannedChange {
                    target: format!("strategy_modifiers.{strategy}.{}", new_modifier.name),
                    old,
                    new: weight,
                    applies: weights.base_strategies.contains_key(strategy)
                        && weight.is_finite(),
                });
            }
        }

        Ok(changes)
    }

    fn apply_all_steps(
        &self,
        suggestion: &AdvisorSuggestion,
        outcome: &mut UpdateOutcome,
    ) -> TuningResult<()> {
        let weights = self.apply_weight_adjustments(&suggestion.weight_adjustments)?;
        outcome.weights_applied = weights.applied;
        outcome.warnings.extend(weights.warnings);

        let modifiers = self.apply_modifier_adjustments(&suggestion.modifier_adjustments)?;
        outcome.modifiers_applied = modifiers.applied;
        outcome.warnings.extend(modifiers.warnings);

        let new_modifiers = self.apply_new_modifiers(&suggestion.suggested_new_modifiers)?;
        outcome.new_modifiers_applied = new_modifiers.applied;
        outcome.warnings.extend(new_modifiers.warnings);
        Ok(())
    }

    fn read_raw(&self) -> TuningResult<String> {
        if !self.config_path.exists() {
            return Err(TuningError::NotFound(format!(
                "scoring config at {}",
                self.config_path.display()
            )));
        }
        fs::read_to_string(&self.config_path).map_err(|e| {
            TuningError::Io(format!("Failed to read {}: {e}", self.config_path.display()))
        })
    }

    fn config_stem(&self) -> TuningResult<String> {
        Ok(self
            .config_path
            .file_stem()
            .ok_or_else(|| {
                TuningError::Io(format!("Invalid file path: {}", self.config_path.display()))
            })?
            .to_string_lossy()
            .into_owned())
    }

    fn backup_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(|parent| parent.join(BACKUP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(BACKUP_DIR_NAME))
    }
}

#[cfg(test)]
#[path = "tests/config_updater_tests.rs"]
mod tests;
