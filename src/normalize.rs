// 🔤 Key Normalizer - Canonical comparison keys for free-text names
// Location names, source names and bias labels all pass through here first
//
// "U.S.", "  us ", "US" → "us"

use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ============================================================================
// KEY NORMALIZATION
// ============================================================================

/// Normalize a string key for comparison
///
/// - Lowercases
/// - Removes periods
/// - Collapses whitespace runs to a single space
/// - Trims leading/trailing whitespace
///
/// Idempotent: `normalize_key(&normalize_key(x)) == normalize_key(x)`
pub fn normalize_key(value: &str) -> String {
    let lowered: String = value
        .to_lowercase()
        .chars()
        .filter(|c| *c != '.')
        .collect();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize an optional value, treating `None` as the empty string
pub fn normalize_opt(value: Option<&str>) -> String {
    value.map(normalize_key).unwrap_or_default()
}

/// Normalize any JSON value (numbers and booleans are stringified first)
pub fn normalize_value(value: &Value) -> String {
    normalize_key(&to_text(value))
}

// ============================================================================
// LENIENT COERCION
// ============================================================================

/// String form of a JSON value; null (and containers) become empty
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Finite number from a JSON value
///
/// Numeric strings are parsed, an empty string counts as 0 and booleans as 0/1.
/// Anything else (or a non-finite result) yields `None`.
pub fn to_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    parsed.filter(|n| n.is_finite())
}

/// Serde helper: accept strings, numbers or booleans as an optional string
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Null => None,
        other => Some(to_text(&other)),
    }))
}

/// Serde helper: accept numbers or numeric strings as an optional finite number
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(to_number))
}

// ============================================================================
// TESTS
// ============================================================================
