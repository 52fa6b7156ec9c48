//! Line classification and keyword-line tokenization.
//!
//! An `.inp` line is one of three things: a comment (`**` prefix), a keyword
//! line (single `*` prefix) or data. Keyword lines are split on commas that
//! sit outside double quotes; the first field is the keyword name and every
//! following field is either a bare flag (`NLGEOM`) or a `KEY=VALUE` pair.

use std::fmt::{Display, Formatter};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{InpError, Result};

pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with("**")
}

pub fn is_keyword(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('*') && !trimmed.starts_with("**")
}

/// True for lines that carry section data: not blank, not a comment, not a keyword.
pub fn is_data(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !is_comment(trimmed) && !is_keyword(trimmed)
}

/// One option on a keyword line. `value` is `None` for bare flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub key: String,
    pub value: Option<String>,
}

/// Ordered option list of a keyword line. Keys are uppercase, values keep
/// their original case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(Vec<Parameter>);

impl Options {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self(parameters)
    }

    /// Value of a `KEY=VALUE` option. Flags yield `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.find(key).and_then(|p| p.value.as_deref())
    }

    /// True if the key is present, either as a flag or with a value.
    pub fn has(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of these options without the given keys.
    pub fn without(&self, keys: &[&str]) -> Options {
        Options(
            self.0
                .iter()
                .filter(|p| !keys.iter().any(|k| p.key.eq_ignore_ascii_case(k)))
                .cloned()
                .collect(),
        )
    }

    fn find(&self, key: &str) -> Option<&Parameter> {
        self.0.iter().find(|p| p.key.eq_ignore_ascii_case(key))
    }
}

impl Serialize for Options {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for p in &self.0 {
            match &p.value {
                Some(v) => map.serialize_entry(&p.key, v)?,
                None => map.serialize_entry(&p.key, &true)?,
            }
        }
        map.end()
    }
}

/// A tokenized keyword line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordLine {
    /// Uppercase keyword name with inner whitespace collapsed, e.g. `SOLID SECTION`.
    pub name: String,
    pub options: Options,
    /// 1-based line number of the keyword line.
    pub line: usize,
    /// Header text without the leading `*`, continuation lines included.
    pub raw: String,
}

impl Display for KeywordLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "*{}", self.raw)
    }
}

pub fn parse_keyword_line(text: &str, line: usize) -> Result<KeywordLine> {
    let raw = text.trim().trim_start_matches('*').trim().to_string();
    let fields = split_fields(&raw).ok_or_else(|| InpError::UnterminatedQuote {
        line,
        text: text.trim().to_string(),
    })?;

    let name = fields
        .first()
        .map(|f| f.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
        .to_ascii_uppercase();
    if name.is_empty() {
        return Err(InpError::EmptyKeyword { line });
    }

    let mut parameters = Vec::new();
    for field in fields.iter().skip(1) {
        let item = field.trim();
        if item.is_empty() {
            continue;
        }
        match unquoted_count(item, '=') {
            0 => parameters.push(Parameter {
                key: item.to_ascii_uppercase(),
                value: None,
            }),
            1 => {
                let (k, v) = item.split_once('=').unwrap_or((item, ""));
                parameters.push(Parameter {
                    key: k.trim().to_ascii_uppercase(),
                    value: Some(unquote(v.trim()).to_string()),
                });
            }
            _ => {
                return Err(InpError::MalformedOption {
                    line,
                    keyword: name,
                    token: item.to_string(),
                });
            }
        }
    }

    Ok(KeywordLine {
        name,
        options: Options(parameters),
        line,
        raw,
    })
}

/// Splits on commas outside double quotes. `None` if a quote is left open.
fn split_fields(header: &str) -> Option<Vec<String>> {
    let mut fields = Vec::<String>::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in header.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if in_quotes {
        return None;
    }
    fields.push(current.trim().to_string());
    Some(fields)
}

fn unquoted_count(text: &str, needle: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for ch in text.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == needle && !in_quotes {
            count += 1;
        }
    }
    count
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("** a comment", true, false)]
    #[case("**NODE", true, false)]
    #[case("*NODE, NSET=ALL", false, true)]
    #[case("  *Element, type=C3D8", false, true)]
    #[case("1, 0.0, 0.0, 0.0", false, false)]
    fn classifies_lines(#[case] line: &str, #[case] comment: bool, #[case] keyword: bool) {
        assert_eq!(is_comment(line), comment);
        assert_eq!(is_keyword(line), keyword);
        assert_eq!(is_data(line), !comment && !keyword);
    }

    #[test]
    fn blank_line_is_not_data() {
        assert!(!is_data("   "));
    }

    #[test]
    fn uppercases_name_and_keys_but_not_values() {
        let kw = parse_keyword_line("*Solid Section, elset=Eall, material=Steel", 3)
            .expect("keyword should parse");
        assert_eq!(kw.name, "SOLID SECTION");
        assert_eq!(kw.options.get("ELSET"), Some("Eall"));
        assert_eq!(kw.options.get("material"), Some("Steel"));
        assert_eq!(kw.line, 3);
    }

    #[test]
    fn bare_options_are_flags() {
        let kw = parse_keyword_line("*NSET, NSET=X, GENERATE", 1).expect("keyword should parse");
        assert!(kw.options.has("GENERATE"));
        assert_eq!(kw.options.get("GENERATE"), None);
        assert_eq!(kw.options.len(), 2);
    }

    #[test]
    fn collapses_whitespace_in_name() {
        let kw = parse_keyword_line("*END   step", 1).expect("keyword should parse");
        assert_eq!(kw.name, "END STEP");
    }

    #[test]
    fn quoted_values_keep_commas_and_spaces() {
        let kw =
            parse_keyword_line(r#"*NSET, NSET="With, quotes""#, 1).expect("keyword should parse");
        assert_eq!(kw.options.get("NSET"), Some("With, quotes"));
    }

    #[test]
    fn rejects_two_equals_in_one_option() {
        let err = parse_keyword_line("*STEP, NAME=A=B", 7).expect_err("should fail");
        assert!(matches!(err, InpError::MalformedOption { line: 7, .. }));
    }

    #[test]
    fn rejects_unterminated_quote() {
        let err =
            parse_keyword_line(r#"*NSET, NSET="With wrong quotes"#, 2).expect_err("should fail");
        assert!(matches!(err, InpError::UnterminatedQuote { line: 2, .. }));
    }

    #[test]
    fn rejects_empty_keyword() {
        let err = parse_keyword_line("*, A=1", 4).expect_err("should fail");
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn without_drops_named_options() {
        let kw = parse_keyword_line("*STEP, NAME=Load, NLGEOM, INC=100", 1)
            .expect("keyword should parse");
        let rest = kw.options.without(&["NAME"]);
        assert_eq!(rest.len(), 2);
        assert!(rest.has("NLGEOM"));
        assert_eq!(rest.get("INC"), Some("100"));
    }
}
