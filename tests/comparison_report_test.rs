//! Comparison Pipeline Suite
//!
//! Saves a month of results for both systems through the parallel data
//! store, loads them back, diffs them, and checks the written report.

mod common;

use std::fs;

use brushtune::services::comparator;
use brushtune::services::parallel_data::ParallelDataManager;
use brushtune::types::match_record::{MatchRecord, MatchedProduct};
use serde_json::json;
use tempfile::TempDir;

// ─── Fixtures ─────────────────────────────────────────────────────

fn record(text: &str, brand: &str, model: &str, match_type: &str) -> MatchRecord {
    MatchRecord {
        original_text: text.to_string(),
        strategy: Some("known_brush".to_string()),
        pattern: Some(format!("{brand} {model}").to_lowercase()),
        match_type: Some(match_type.to_string()),
        matched: Some(MatchedProduct {
            brand: brand.to_string(),
            model: model.to_string(),
            fiber: None,
            knot_size_mm: None,
            handle_maker: None,
        }),
    }
}

fn unmatched(text: &str) -> MatchRecord {
    MatchRecord {
        original_text: text.to_string(),
        strategy: None,
        pattern: None,
        match_type: None,
        matched: None,
    }
}

// ─── Pipeline Tests ───────────────────────────────────────────────

#[test]
fn parallel_store_round_trips_a_monthly_run() {
    common::init_logging();
    let tmp = TempDir::new().unwrap();
    let manager = ParallelDataManager::new(tmp.path());

    let document = json!({
        "metadata": {"month": "2025-06", "total_shaves": 2},
        "records": [
            record("Simpson Chubby 2", "Simpson", "Chubby 2", "exact"),
            unmatched("mystery brush"),
        ],
    });

    let saved_path = manager
        .save("2025-06", "current", &document)
        .expect("save should succeed");
    assert!(saved_path.ends_with("matched/2025-06.json"));
    assert!(manager.file_exists("2025-06", "current").unwrap());
    assert!(
        !manager.file_exists("2025-06", "new").unwrap(),
        "systems must not share files"
    );

    let loaded = manager
        .load("2025-06", "current")
        .expect("load should succeed");
    let records: Vec<MatchRecord> =
        serde_json::from_value(loaded["records"].clone()).expect("records should deserialize");
    assert_eq!(records.len(), 2);
    assert!(records[0].is_matched());
    assert!(!records[1].is_matched());

    let metadata = manager
        .get_metadata("2025-06", "current")
        .expect("metadata lookup should succeed")
        .expect("metadata should be present");
    assert_eq!(metadata["total_shaves"], 2);
}

#[test]
fn comparison_pipeline_produces_a_written_report() {
    common::init_logging();
    let tmp = TempDir::new().unwrap();
    let manager = ParallelDataManager::new(tmp.path());

    let old_records = vec![
        record("Simpson Chubby 2 Synthetic", "Simpson", "Chubby 2", "exact"),
        record("Omega 10048 boar", "Omega", "10048", "regex"),
        unmatched("Declaration Grooming B15"),
        unmatched("no brush here"),
    ];
    let new_records = vec![
        record("Simpson Chubby 2 Synthetic", "Simpson", "Chubby 2", "exact"),
        record("Omega 10048 boar", "Omega", "Pro 48", "alias"),
        record("Declaration Grooming B15", "Declaration Grooming", "B15", "exact"),
        unmatched("no brush here"),
    ];

    manager
        .save("2025-06", "current", &json!({ "records": old_records }))
        .unwrap();
    manager
        .save("2025-06", "new", &json!({ "records": new_records }))
        .unwrap();

    let old_loaded: Vec<MatchRecord> =
        serde_json::from_value(manager.load("2025-06", "current").unwrap()["records"].clone())
            .unwrap();
    let new_loaded: Vec<MatchRecord> =
        serde_json::from_value(manager.load("2025-06", "new").unwrap()["records"].clone())
            .unwrap();

    let comparison = comparator::compare(&old_loaded, &new_loaded).expect("same record count");
    let summary = &comparison.summary;
    assert_eq!(summary.total_records, 4);
    assert_eq!(summary.matching_results, 1);
    assert_eq!(summary.different_results, 1);
    assert_eq!(summary.old_only_matches, 0);
    assert_eq!(summary.new_only_matches, 1);
    assert_eq!(summary.both_unmatched, 1);
    assert_eq!(summary.match_type_changes["regex_to_alias"], 1);
    assert_eq!(summary.field_changes.model, 1);

    let stats = comparison.statistical_summary();
    assert_eq!(stats.agreement_rate, 0.5);
    assert_eq!(stats.old_success_rate, 0.25);
    assert_eq!(stats.new_success_rate, 0.5);
    assert_eq!(
        stats.most_common_transition.unwrap().transition,
        "regex_to_alias"
    );

    let report_path = tmp.path().join("reports").join("2025-06-comparison.json");
    comparison
        .write_report(&report_path)
        .expect("report write should succeed");

    let raw = fs::read_to_string(&report_path).unwrap();
    let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(document["summary"]["total_records"], 4);
    assert_eq!(document["summary"]["matching_pct"], 25.0);
    assert_eq!(document["summary"]["new_only_pct"], 25.0);
    assert_eq!(document["total_differences"], 1);
    assert_eq!(
        document["detailed_differences"][0]["match_type_transition"],
        "regex_to_alias"
    );
    assert_eq!(
        document["detailed_differences"][0]["changed_fields"][0],
        "model"
    );
}

#[test]
fn record_count_mismatch_is_fatal() {
    common::init_logging();

    let old = vec![unmatched("only the old run saw this")];
    let new: Vec<MatchRecord> = vec![];

    let error = comparator::compare(&old, &new).expect_err("lengths differ");
    assert_eq!(
        error.to_string(),
        "Record count mismatch: old run has 1 records, new run has 0"
    );
}
