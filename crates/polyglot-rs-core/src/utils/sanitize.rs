//! Coercion of loosely typed input.
//!
//! Stored payloads and caller input arrive as JSON values whose types cannot
//! be trusted. These helpers never fail: anything that does not coerce comes
//! back as the neutral value (`None`, `false`, empty string).

use serde_json::Value;

use super::text::strip_tags;

/// Returns `id` if it is a valid object id (strictly positive).
pub const fn object_id(id: i64) -> Option<i64> {
    if id > 0 {
        Some(id)
    } else {
        None
    }
}

/// Coerces a JSON value to a strictly positive integer.
///
/// Accepts integers, integral floats, and strings holding a decimal integer.
///
/// # Examples
///
/// ```
/// use polyglot_rs_core::utils::sanitize::positive_int;
/// use serde_json::json;
///
/// assert_eq!(positive_int(&json!(12)), Some(12));
/// assert_eq!(positive_int(&json!(" 7 ")), Some(7));
/// assert_eq!(positive_int(&json!("12abc")), None);
/// assert_eq!(positive_int(&json!(-3)), None);
/// ```
pub fn positive_int(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        })?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    object_id(n)
}

/// Coerces a JSON value to a non-negative integer, defaulting to zero.
pub fn non_negative_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().filter(|n| *n >= 0).unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().ok().filter(|n| *n >= 0).unwrap_or(0),
        Value::Bool(true) => 1,
        _ => 0,
    }
}

/// Coerces a JSON value to a boolean.
///
/// `true`, non-zero numbers, and the strings "1", "true", "yes", "on" are
/// true; everything else is false.
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        _ => false,
    }
}

/// Coerces a JSON value to plain text: tags stripped, whitespace trimmed.
///
/// Numbers are rendered; arrays, objects, and null become the empty string.
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => strip_tags(s).trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Coerces a JSON value to a list of trimmed, non-empty strings.
///
/// Accepts an array of strings or a comma-separated string.
pub fn text_list(value: &Value) -> Vec<String> {
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().map(text).collect(),
        Value::String(s) => s.split(',').map(|part| part.trim().to_string()).collect(),
        _ => Vec::new(),
    };
    items.into_iter().filter(|item| !item.is_empty()).collect()
}
