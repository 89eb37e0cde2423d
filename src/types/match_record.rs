//! Records emitted by a matcher run over one month of raw input strings.

use serde::{Deserialize, Serialize};

/// One matcher decision for a single raw input string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Raw input text the matcher was asked to resolve.
    pub original_text: String,
    /// Strategy that produced the match (e.g. "known_brush").
    #[serde(default)]
    pub strategy: Option<String>,
    /// Pattern the winning strategy fired on.
    #[serde(default)]
    pub pattern: Option<String>,
    /// How the pattern matched: "exact", "regex", "alias", "brand_default", ...
    #[serde(default)]
    pub match_type: Option<String>,
    /// Resolved catalog product, absent when the matcher gave up.
    #[serde(default)]
    pub matched: Option<MatchedProduct>,
}

impl MatchRecord {
    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}

/// Catalog product a record resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedProduct {
    pub brand: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knot_size_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle_maker: Option<String>,
}

impl MatchedProduct {
    /// Names of the fields whose values differ between the two products.
    pub fn changed_fields(&self, other: &MatchedProduct) -> Vec<String> {
        let mut changed = Vec::new();
        if self.brand != other.brand {
            changed.push("brand".to_string());
        }
        if self.model != other.model {
            changed.push("model".to_string());
        }
        if self.fiber != other.fiber {
            changed.push("fiber".to_string());
        }
        if self.knot_size_mm != other.knot_size_mm {
            changed.push("knot_size_mm".to_string());
        }
        if self.handle_maker != other.handle_maker {
            changed.push("handle_maker".to_string());
        }
        changed
    }
}

#[cfg(test)]
#[path = "tests/match_record_tests.rs"]
mod tests;
