//! Setting value helpers.

use serde::{Deserialize, Serialize};

/// Canonical string form of a contributed value.
pub fn normalize_value(raw: &str) -> String {
    raw.trim().to_string()
}

/// Parse an integer without octal interpretation.
///
/// Accepts an optional sign followed by either decimal digits or a `0x`/`0X`
/// hex literal. Leading zeros are decimal: `"010"` is ten.
pub fn parse_int_no_octal(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        i64::from_str_radix(hex, 16).ok()?
    } else {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<i64>().ok()?
    };

    Some(if negative { -magnitude } else { magnitude })
}

/// True for a non-negative decimal or `0x` hex literal, whether or not it
/// fits in an `i64`.
pub(crate) fn is_unsigned_int_literal(s: &str) -> bool {
    let s = s.trim();
    let digits = s.strip_prefix('+').unwrap_or(s);
    match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
    }
}

/// Truthiness of a setting value: empty and integer zero are false,
/// everything else is true.
pub fn value_is_true(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    !matches!(parse_int_no_octal(value), Some(0))
}

/// A scalar as written in TOML or JSON input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ScalarValue {
    /// Render as a setting value. Booleans become `1`/`0`.
    pub fn to_setting_string(&self) -> String {
        match self {
            ScalarValue::Bool(true) => "1".to_string(),
            ScalarValue::Bool(false) => "0".to_string(),
            ScalarValue::Int(i) => i.to_string(),
            ScalarValue::Float(f) => f.to_string(),
            ScalarValue::Str(s) => normalize_value(s),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Str(s.to_string())
    }
}
