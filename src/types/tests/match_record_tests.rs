use crate::types::match_record::{MatchRecord, MatchedProduct};

fn product(brand: &str, model: &str) -> MatchedProduct {
    MatchedProduct {
        brand: brand.to_string(),
        model: model.to_string(),
        fiber: None,
        knot_size_mm: None,
        handle_maker: None,
    }
}

#[test]
fn test_changed_fields_reports_only_differing_fields() {
    let mut old = product("Simpson", "Chubby 2");
    old.fiber = Some("Badger".to_string());
    let mut new = product("Simpson", "Chubby 3");
    new.fiber = Some("Badger".to_string());
    new.knot_size_mm = Some(27.0);

    let changed = old.changed_fields(&new);

    assert_eq!(changed, vec!["model", "knot_size_mm"]);
}

#[test]
fn test_changed_fields_empty_for_identical_products() {
    let a = product("Zenith", "B35");
    assert!(a.changed_fields(&product("Zenith", "B35")).is_empty());
}

#[test]
fn test_record_deserializes_with_missing_optional_fields() {
    let raw = r#"{"original_text": "mystery brush"}"#;
    let record: MatchRecord = serde_json::from_str(raw).unwrap();

    assert_eq!(record.original_text, "mystery brush");
    assert!(record.strategy.is_none());
    assert!(record.match_type.is_none());
    assert!(!record.is_matched());
}

#[test]
fn test_product_serialization_omits_absent_optionals() {
    let json = serde_json::to_string(&product("Omega", "10048")).unwrap();

    assert!(!json.contains("fiber"));
    assert!(!json.contains("knot_size_mm"));
    assert!(!json.contains("handle_maker"));
}
