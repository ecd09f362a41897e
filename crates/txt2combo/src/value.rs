//! value representation
//!
//! Every resolved column holds one of
//! - boolean (true/false)
//! - integer (signed, i64)
//! - decimal (f64)
//! - string (utf-8, also used for `textbox` columns)
//!
//! Conversion from raw text ([Value::convert]) never fails. Text that does not parse becomes the zero value of the
//! requested type.
use crate::column::ColumnType;
use serde::Serializer;

/// All possible value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
}

/// Tokens that convert to `true`, compared case insensitively
pub const TRUE_TOKENS: [&str; 4] = ["true", "1", "yes", "on"];

impl Value {
    /// Convert a raw text field into a value of `column_type`
    pub fn convert(raw: &str, column_type: ColumnType) -> Value {
        let raw = raw.trim();
        match column_type {
            ColumnType::Int => Value::Integer(parse_integer(raw)),
            ColumnType::Float => Value::Decimal(parse_decimal(raw).unwrap_or(0.0)),
            ColumnType::Bool => Value::Boolean(is_true_token(raw)),
            ColumnType::String | ColumnType::Textbox => Value::String(raw.to_string()),
        }
    }
}

pub(crate) fn is_true_token(raw: &str) -> bool {
    TRUE_TOKENS
        .iter()
        .any(|token| token.eq_ignore_ascii_case(raw.trim()))
}

/// Decimal comma becomes a decimal point. When more than one point remains, all but the last one are thousands
/// separators: `1.234,5` and `1,234.5` both read as `1234.5`.
fn normalize_decimal(raw: &str) -> String {
    let normalized = raw.replace(',', ".");
    match normalized.rsplit_once('.') {
        Some((whole, fraction)) if whole.contains('.') => {
            format!("{}.{}", whole.replace('.', ""), fraction)
        }
        _ => normalized,
    }
}

fn parse_decimal(raw: &str) -> Option<f64> {
    normalize_decimal(raw).parse::<f64>().ok()
}

fn parse_integer(raw: &str) -> i64 {
    match parse_decimal(raw) {
        Some(decimal) if decimal.is_finite() => decimal.trunc() as i64,
        _ => 0,
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

/// Text form used when a value is spliced into a concatenation
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Decimal(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            Value::Decimal(value) => write!(f, "{value}"),
            Value::String(value) => f.write_str(value),
        }
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Decimal(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decimal_comma_and_thousands() {
        assert_eq!(Value::convert("1.234,5", ColumnType::Float), Value::Decimal(1234.5));
        assert_eq!(Value::convert("1,234.5", ColumnType::Float), Value::Decimal(1234.5));
        assert_eq!(Value::convert("0,25", ColumnType::Float), Value::Decimal(0.25));
        assert_eq!(Value::convert("1.7778", ColumnType::Float), Value::Decimal(1.7778));
    }

    #[test]
    fn integers_truncate() {
        assert_eq!(Value::convert("1920", ColumnType::Int), Value::Integer(1920));
        assert_eq!(Value::convert("1.234,5", ColumnType::Int), Value::Integer(1234));
        assert_eq!(Value::convert("2,9", ColumnType::Int), Value::Integer(2));
        assert_eq!(Value::convert("-3.7", ColumnType::Int), Value::Integer(-3));
    }

    #[test]
    fn malformed_numbers_become_zero() {
        assert_eq!(Value::convert("abc", ColumnType::Int), Value::Integer(0));
        assert_eq!(Value::convert("", ColumnType::Int), Value::Integer(0));
        assert_eq!(Value::convert("inf", ColumnType::Int), Value::Integer(0));
        assert_eq!(Value::convert("12px", ColumnType::Float), Value::Decimal(0.0));
    }

    #[test]
    fn booleans() {
        assert_eq!(Value::convert("YES", ColumnType::Bool), Value::Boolean(true));
        assert_eq!(Value::convert(" on ", ColumnType::Bool), Value::Boolean(true));
        assert_eq!(Value::convert("1", ColumnType::Bool), Value::Boolean(true));
        assert_eq!(Value::convert("off", ColumnType::Bool), Value::Boolean(false));
        assert_eq!(Value::convert("maybe", ColumnType::Bool), Value::Boolean(false));
    }

    #[test]
    fn strings_are_trimmed() {
        assert_eq!(
            Value::convert("  John  ", ColumnType::String),
            Value::String("John".into())
        );
        assert_eq!(
            Value::convert(" long text ", ColumnType::Textbox),
            Value::String("long text".into())
        );
    }

    #[test]
    fn display_for_concatenation() {
        assert_eq!(Value::Decimal(1.0).to_string(), "1.0");
        assert_eq!(Value::Decimal(1.5).to_string(), "1.5");
        assert_eq!(Value::Integer(3).to_string(), "3");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }
}
