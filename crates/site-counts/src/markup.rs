//! HTML helpers shared by the block renderers.
//!
//! Escaping and class sanitization follow the host's conventions, and the
//! loose truthiness/integer helpers describe how cached JSON payloads are
//! interpreted when the block renders them.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static PERCENT_OCTET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new("%[a-fA-F0-9][a-fA-F0-9]").ok());

/// Escape a string for safe embedding in HTML text or attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Escape a string for an HTML attribute value, encoding `'` as `&#039;`.
pub fn attr_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Reduce an arbitrary string to a single valid HTML class token.
///
/// The input is attribute-escaped first, then percent-encoded octets are
/// removed along with every character outside `[A-Za-z0-9_-]`. Returns `None`
/// when nothing survives.
pub fn sanitize_html_class(raw: &str) -> Option<String> {
    let escaped = attr_escape(raw);
    let stripped = match PERCENT_OCTET.as_ref() {
        Some(re) => re.replace_all(&escaped, "").into_owned(),
        None => escaped,
    };
    let class: String = stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    (!class.is_empty()).then_some(class)
}

/// Whether a string counts as "empty" for optional attributes (`""` and `"0"`).
pub fn is_blank(s: &str) -> bool {
    s.is_empty() || s == "0"
}

/// Loose truthiness of a cached payload.
///
/// `null`, `false`, `0`, `0.0`, `""`, `"0"`, `[]` and `{}` are falsy;
/// everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !is_blank(s),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Loose integer conversion of a cached payload.
///
/// Collections convert to `1` when non-empty and `0` otherwise, strings use
/// their leading integer digits, floats truncate toward zero.
pub fn loose_int(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => leading_int(s),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
    }
}

/// String form of a scalar payload value as it appears in rendered text.
pub fn display_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) => "Array".to_string(),
        Value::Object(_) => "Object".to_string(),
    }
}

fn leading_int(s: &str) -> i64 {
    let trimmed = s.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}
