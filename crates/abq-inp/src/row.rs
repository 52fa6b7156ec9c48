//! Data-line tokenizing: numeric token extraction and typed row fields.

use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static NUMBER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("valid number regex")
});
static INTEGER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d+").expect("valid integer regex"));
static INTEGER_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?\d+$").expect("valid integer regex"));
static FLOAT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?$").expect("valid float regex")
});

/// All maximal signed decimal/exponent runs in a line, in order.
pub fn number_tokens(line: &str) -> Vec<&str> {
    NUMBER_TOKEN.find_iter(line).map(|m| m.as_str()).collect()
}

/// All signed integer runs in a line, in order, unparsed. Callers pick the
/// integer width and report runs that do not fit.
pub fn integer_tokens(line: &str) -> Vec<&str> {
    INTEGER_TOKEN.find_iter(line).map(|m| m.as_str()).collect()
}

/// One comma-separated field of a data row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Symbol(String),
}

impl Value {
    pub fn parse(field: &str) -> Self {
        let field = field.trim();
        if INTEGER_FIELD.is_match(field)
            && let Ok(v) = field.parse::<i64>()
        {
            return Value::Int(v);
        }
        if FLOAT_FIELD.is_match(field)
            && let Ok(v) = field.parse::<f64>()
        {
            return Value::Float(v);
        }
        Value::Symbol(field.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Symbol(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Symbol(s) => f.write_str(s),
        }
    }
}

/// Strips surrounding commas and spaces, splits on `,` and types each field.
/// Empty fields are skipped.
pub fn parse_data_row(line: &str) -> Vec<Value> {
    line.trim_matches(|c: char| c == ',' || c.is_whitespace())
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(Value::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn extracts_number_tokens_in_order() {
        assert_eq!(
            number_tokens("12, -1.5e3, .25,4."),
            vec!["12", "-1.5e3", ".25", "4."]
        );
    }

    #[test]
    fn extracts_integer_tokens() {
        assert_eq!(integer_tokens("1, 2,3 ,\t4,"), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn integer_tokens_keep_oversized_runs() {
        assert_eq!(
            integer_tokens("1, 99999999999999999999, -2"),
            vec!["1", "99999999999999999999", "-2"]
        );
    }

    #[rstest]
    #[case("42", Value::Int(42))]
    #[case("-7", Value::Int(-7))]
    #[case("2.1e5", Value::Float(2.1e5))]
    #[case("0.3", Value::Float(0.3))]
    #[case("1.", Value::Float(1.0))]
    #[case("NALL", Value::Symbol("NALL".to_string()))]
    #[case("Fixed_1", Value::Symbol("Fixed_1".to_string()))]
    fn types_fields(#[case] field: &str, #[case] expected: Value) {
        assert_eq!(Value::parse(field), expected);
    }

    #[test]
    fn data_row_strips_outer_commas() {
        let row = parse_data_row(" , NALL, 1, 3, 0.0, ");
        assert_eq!(
            row,
            vec![
                Value::Symbol("NALL".to_string()),
                Value::Int(1),
                Value::Int(3),
                Value::Float(0.0),
            ]
        );
    }

    #[test]
    fn numeric_accessors() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(3.5).as_int(), None);
        assert_eq!(Value::Symbol("X".into()).as_f64(), None);
        assert_eq!(Value::Symbol("X".into()).as_symbol(), Some("X"));
    }
}
