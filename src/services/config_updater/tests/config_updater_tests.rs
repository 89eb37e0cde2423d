use super::*;
use crate::services::advisor::AnalysisType;
use tempfile::TempDir;

const STARTER_CONFIG: &str = "\
# Brush scoring weights.
# Tuned from monthly validation runs.

[brush_scoring_weights.base_strategies]
known_brush = 80.0
omega_semogue = 60.0
other_brushes = 40.0

[brush_scoring_weights.strategy_modifiers.known_brush]
exact_phrase = 15.0
fiber_hint = -5.0

[brush_scoring_weights.strategy_modifiers.omega_semogue]
fiber_hint = -5.0
";

fn write_starter(tmp: &TempDir) -> PathBuf {
    let path = tmp.path().join("scoring.toml");
    fs::write(&path, STARTER_CONFIG).unwrap();
    path
}

fn weight_map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

fn suggestion_with(
    weights: &[(&str, f64)],
    modifiers: &[(&str, f64)],
    new_modifiers: Vec<SuggestedModifier>,
) -> AdvisorSuggestion {
    AdvisorSuggestion {
        analysis_type: AnalysisType::StrategyAnalysis,
        weight_adjustments: weight_map(weights),
        modifier_adjustments: weight_map(modifiers),
        suggested_new_modifiers: new_modifiers,
        reasoning: "scripted".to_string(),
        warning: None,
    }
}

fn two_band_modifier() -> SuggestedModifier {
    SuggestedModifier {
        name: "two_band".to_string(),
        pattern: "two band".to_string(),
        suggested_weights: weight_map(&[("known_brush", 12.0)]),
        test_cases: vec!["Simpson two band badger".to_string()],
    }
}

#[test]
fn test_load_configuration_parses_weights_and_modifiers() {
    let tmp = TempDir::new().unwrap();
    let updater = ConfigUpdater::new(write_starter(&tmp));

    let config = updater.load_configuration().unwrap();
    let weights = &config.brush_scoring_weights;

    assert_eq!(weights.base_strategies["known_brush"], 80.0);
    assert_eq!(weights.strategy_modifiers["known_brush"]["exact_phrase"], 15.0);
    assert_eq!(weights.strategy_modifiers["omega_semogue"]["fiber_hint"], -5.0);
}

#[test]
fn test_load_configuration_rejects_corrupt_toml() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("scoring.toml");
    fs::write(&path, "[brush_scoring_weights\nnot toml").unwrap();

    let result = ConfigUpdater::new(path).load_configuration();
    assert!(matches!(result, Err(TuningError::Parse(_))));
}

#[test]
fn test_save_configuration_round_trips_losslessly() {
    let tmp = TempDir::new().unwrap();
    let updater = ConfigUpdater::new(write_starter(&tmp));

    let loaded = updater.load_configuration().unwrap();
    updater.save_configuration(&loaded).unwrap();
    let reloaded = updater.load_configuration().unwrap();

    assert_eq!(
        loaded.brush_scoring_weights.base_strategies,
        reloaded.brush_scoring_weights.base_strategies
    );
    assert_eq!(
        loaded.brush_scoring_weights.strategy_modifiers,
        reloaded.brush_scoring_weights.strategy_modifiers
    );
}

#[test]
fn test_weight_adjustments_apply_known_and_warn_unknown() {
    let tmp = TempDir::new().unwrap();
    let updater = ConfigUpdater::new(write_starter(&tmp));

    let outcome = updater
        .apply_weight_adjustments(&weight_map(&[("known_brush", 85.0), ("imaginary", 75.0)]))
        .unwrap();

    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("imaginary"));

    let reloaded = updater.load_configuration().unwrap();
    assert_eq!(reloaded.brush_scoring_weights.base_strategies["known_brush"], 85.0);
    assert_eq!(reloaded.brush_scoring_weights.base_strategies["omega_semogue"], 60.0);
    assert!(
        !reloaded.brush_scoring_weights.base_strategies.contains_key("imaginary"),
        "Unknown strategies must never be created"
    );
}

#[test]
fn test_all_invalid_weight_adjustments_fail_without_writing() {
    let tmp = TempDir::new().unwrap();
    let path = write_starter(&tmp);
    let updater = ConfigUpdater::new(path.clone());

    let result = updater.apply_weight_adjustments(&weight_map(&[("known_brush", -10.0)]));

    assert!(matches!(result, Err(TuningError::InvalidConfig(_))));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        STARTER_CONFIG,
        "A fully rejected adjustment must leave the file untouched"
    );
}

#[test]
fn test_all_unknown_but_valid_weights_succeed_without_writing() {
    let tmp = TempDir::new().unwrap();
    let path = write_starter(&tmp);
    let updater = ConfigUpdater::new(path.clone());

    let outcome = updater
        .apply_weight_adjustments(&weight_map(&[("imaginary", 75.0)]))
        .unwrap();

    assert_eq!(outcome.applied, 0);
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_CONFIG);
}

#[test]
fn test_modifier_adjustments_broadcast_to_declaring_strategies() {
    let tmp = TempDir::new().unwrap();
    let updater = ConfigUpdater::new(write_starter(&tmp));

    let outcome = updater
        .apply_modifier_adjustments(&weight_map(&[("fiber_hint", -8.0)]))
        .unwrap();

    assert_eq!(outcome.applied, 2, "fiber_hint is declared by two strategies");

    let reloaded = updater.load_configuration().unwrap();
    let modifiers = &reloaded.brush_scoring_weights.strategy_modifiers;
    assert_eq!(modifiers["known_brush"]["fiber_hint"], -8.0);
    assert_eq!(modifiers["omega_semogue"]["fiber_hint"], -8.0);
    assert_eq!(modifiers["known_brush"]["exact_phrase"], 15.0);
}

#[test]
fn test_modifier_adjustments_warn_on_undeclared_name() {
    let tmp = TempDir::new().unwrap();
    let path = write_starter(&tmp);
    let updater = ConfigUpdater::new(path.clone());

    let outcome = updater
        .apply_modifier_adjustments(&weight_map(&[("ghost", 3.0)]))
        .unwrap();

    assert_eq!(outcome.applied, 0);
    assert!(outcome.warnings[0].contains("ghost"));
    assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_CONFIG);
}

#[test]
fn test_all_non_finite_modifier_adjustments_fail() {
    let tmp = TempDir::new().unwrap();
    let path = write_starter(&tmp);
    let updater = ConfigUpdater::new(path.clone());

    let result = updater.apply_modifier_adjustments(&weight_map(&[("fiber_hint", f64::NAN)]));

    assert!(matches!(result, Err(TuningError::InvalidConfig(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_CONFIG);
}

#[test]
fn test_apply_new_modifiers_installs_and_skips_unknown_strategy() {
    let tmp = TempDir::new().unwrap();
    let updater = ConfigUpdater::new(write_starter(&tmp));

    let mut modifier = two_band_modifier();
    modifier
        .suggested_weights
        .insert("imaginary".to_string(), 9.0);

    let outcome = updater.apply_new_modifiers(&[modifier]).unwrap();

    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("imaginary"));

    let reloaded = updater.load_configuration().unwrap();
    let modifiers = &reloaded.brush_scoring_weights.strategy_modifiers;
    assert_eq!(modifiers["known_brush"]["two_band"], 12.0);
    assert!(!modifiers.contains_key("imaginary"));
}

#[test]
fn test_backup_then_rollback_restores_original_bytes() {
    let tmp = TempDir::new().unwrap();
    let path = write_starter(&tmp);
    let updater = ConfigUpdater::new(path.clone());

    let backup_path = updater.create_backup().unwrap();
    assert!(backup_path.exists());
    assert_eq!(fs::read_to_string(&backup_path).unwrap(), STARTER_CONFIG);

    updater
        .apply_weight_adjustments(&weight_map(&[("known_brush", 99.0)]))
        .unwrap();
    assert_ne!(fs::read_to_string(&path).unwrap(), STARTER_CONFIG);

    let restored = updater.rollback_to_latest_backup().unwrap();
    assert_eq!(restored, Some(backup_path));
    assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_CONFIG);
}

#[test]
fn test_rollback_without_backups_returns_none() {
    let tmp = TempDir::new().unwrap();
    let path = write_starter(&tmp);
    let updater = ConfigUpdater::new(path.clone());

    assert_eq!(updater.rollback_to_latest_backup().unwrap(), None);
    assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_CONFIG);
}

#[test]
fn test_list_backups_sorted_oldest_first() {
    let tmp = TempDir::new().unwrap();
    let updater = ConfigUpdater::new(write_starter(&tmp));

    let first = updater.create_backup().unwrap();
    let second = updater.create_backup().unwrap();

    let backups = updater.list_backups().unwrap();
    assert_eq!(backups, vec![first.clone(), second]);
    assert!(first.parent().unwrap().ends_with("backups"));
    assert!(first
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("scoring."));
}

#[test]
fn test_list_backups_ignores_sibling_config_backups() {
    let tmp = TempDir::new().unwrap();
    let path = write_starter(&tmp);
    let updater = ConfigUpdater::new(path.clone());

    let backup = updater.create_backup().unwrap();
    let stray = backup
        .parent()
        .unwrap()
        .join("scoring.v2.99999999999999999999999.bak");
    fs::write(&stray, "known_brush = 1.0\n").unwrap();

    updater
        .apply_weight_adjustments(&weight_map(&[("known_brush", 99.0)]))
        .unwrap();

    assert_eq!(updater.list_backups().unwrap(), vec![backup.clone()]);

    let restored = updater.rollback_to_latest_backup().unwrap();
    assert_eq!(restored, Some(backup));
    assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_CONFIG);
}

#[test]
fn test_apply_advisor_suggestions_runs_all_steps() {
    let tmp = TempDir::new().unwrap();
    let updater = ConfigUpdater::new(write_starter(&tmp));

    let suggestion = suggestion_with(
        &[("known_brush", 90.0)],
        &[("fiber_hint", -10.0)],
        vec![two_band_modifier()],
    );

    let outcome = updater.apply_advisor_suggestions(&suggestion).unwrap();

    assert!(outcome.success);
    assert!(!outcome.rolled_back);
    assert_eq!(outcome.weights_applied, 1);
    assert_eq!(outcome.modifiers_applied, 2);
    assert_eq!(outcome.new_modifiers_applied, 1);
    assert!(outcome.backup_path.as_ref().unwrap().exists());

    let reloaded = updater.load_configuration().unwrap();
    let weights = &reloaded.brush_scoring_weights;
    assert_eq!(weights.base_strategies["known_brush"], 90.0);
    assert_eq!(weights.strategy_modifiers["omega_semogue"]["fiber_hint"], -10.0);
    assert_eq!(weights.strategy_modifiers["known_brush"]["two_band"], 12.0);
}

#[test]
fn test_apply_advisor_suggestions_rolls_back_on_step_failure() {
    let tmp = TempDir::new().unwrap();
    let path = write_starter(&tmp);
    let updater = ConfigUpdater::new(path.clone());

    // Weights apply first, then the all-invalid modifier step fails.
    let suggestion = suggestion_with(
        &[("known_brush", 85.0)],
        &[("fiber_hint", f64::NAN)],
        vec![],
    );

    let outcome = updater.apply_advisor_suggestions(&suggestion).unwrap();

    assert!(!outcome.success);
    assert!(outcome.rolled_back);
    assert!(!outcome.warnings.is_empty());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        STARTER_CONFIG,
        "Rollback must undo the weight step that already wrote"
    );
}

#[test]
fn test_validation_issues_flags_structural_problems() {
    let starter: ScoringConfig = toml::from_str(STARTER_CONFIG).unwrap();
    assert!(validation_issues(&starter).is_empty());

    let empty = ScoringConfig::default();
    assert_eq!(validation_issues(&empty), vec!["base_strategies is empty"]);

    let mut out_of_range = starter.clone();
    out_of_range
        .brush_scoring_weights
        .base_strategies
        .insert("known_brush".to_string(), 2000.0);
    let issues = validation_issues(&out_of_range);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].contains("known_brush"));

    let mut non_finite = starter.clone();
    non_finite
        .brush_scoring_weights
        .strategy_modifiers
        .get_mut("known_brush")
        .unwrap()
        .insert("fiber_hint".to_string(), f64::INFINITY);
    let issues = validation_issues(&non_finite);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].contains("fiber_hint"));
}

#[test]
fn test_preview_changes_reports_diff_without_writing() {
    let tmp = TempDir::new().unwrap();
    let path = write_starter(&tmp);
    let updater = ConfigUpdater::new(path.clone());

    let suggestion = suggestion_with(
        &[("known_brush", 90.0), ("imaginary", 50.0)],
        &[("fiber_hint", -7.0), ("ghost", 1.0)],
        vec![two_band_modifier()],
    );

    let changes = updater.preview_changes(&suggestion).unwrap();
    let find = |target: &str| {
        changes
            .iter()
            .find(|change| change.target == target)
            .unwrap_or_else(|| panic!("missing planned change for {target}"))
    };

    let known = find("base_strategies.known_brush");
    assert_eq!(known.old, Some(80.0));
    assert_eq!(known.new, 90.0);
    assert!(known.applies);

    assert!(!find("base_strategies.imaginary").applies);
    assert_eq!(find("strategy_modifiers.omega_semogue.fiber_hint").old, Some(-5.0));
    assert!(!find("strategy_modifiers.*.ghost").applies);

    let installed = find("strategy_modifiers.known_brush.two_band");
    assert_eq!(installed.old, None);
    assert!(installed.applies);

    assert_eq!(changes.len(), 6);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        STARTER_CONFIG,
        "Preview must not touch the file"
    );
}

#[test]
fn test_preamble_comments_survive_saves() {
    let tmp = TempDir::new().unwrap();
    let path = write_starter(&tmp);
    let updater = ConfigUpdater::new(path.clone());

    updater
        .apply_weight_adjustments(&weight_map(&[("known_brush", 85.0)]))
        .unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with(
        "# Brush scoring weights.\n# Tuned from monthly validation runs.\n\n"
    ));
    assert!(written.contains("known_brush = 85.0"));
}
