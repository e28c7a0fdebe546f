//! Depth-first scanner for parsed request bodies.
//!
//! Walks a [`serde_json::Value`] and applies one category matcher to every
//! string leaf, short-circuiting on the first hit. Arrays are an explicit
//! case (elements visited in order, keyed by index), not an accident of
//! object-style traversal.

use fusion_domain::ThreatCategory;
use serde_json::Value;

use crate::threat_patterns::matches_category;

/// The first offending string found in a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHit {
    /// Property key (or array index path) that held the value.
    pub key: String,
    /// The offending string value.
    pub value: String,
}

/// Parses a raw request body for scanning.
///
/// Malformed JSON is not rejected: the body is wrapped as `{"raw": body}` so
/// it is still inspected as a single string field.
#[must_use]
pub fn parse_request_body(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({ "raw": raw }))
}

/// Returns the first value in the body matching any pattern of the category.
#[must_use]
pub fn scan_body(category: ThreatCategory, body: &Value) -> Option<ScanHit> {
    visit("", category, body)
}

fn visit(key: &str, category: ThreatCategory, value: &Value) -> Option<ScanHit> {
    match value {
        Value::String(text) => matches_category(category, text).then(|| ScanHit {
            key: key.to_owned(),
            value: text.clone(),
        }),
        Value::Object(map) => map
            .iter()
            .find_map(|(child_key, child)| visit(child_key, category, child)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(index, child)| visit(&format!("{key}[{index}]"), category, child)),
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    }
}
