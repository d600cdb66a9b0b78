//! Reading the filter wire grammar back into a generic document.
//!
//! The wire grammar is JSON with bare keys (`path:`) and bare enum values
//! (`operator: Equal`). [`to_generic_tree`] quotes both and hands the result
//! to `serde_json`. String literals are copied through untouched, so a text
//! value that happens to contain `word:` survives.

use crate::error::{Result, SeekerError};

/// Parses serialized filter text into a generic nested document.
///
/// This only has to understand text produced by
/// [`FilterNode::to_wire`](crate::FilterNode::to_wire). The result preserves
/// `path`, `operator` and the value field of every leaf.
///
/// ```
/// use serde_json::json;
/// use weaviate_seeker::to_generic_tree;
///
/// let tree = to_generic_tree(r#"{ path: ["title"], operator: Equal, valueText: "a: b" }"#).unwrap();
/// assert_eq!(tree, json!({"path": ["title"], "operator": "Equal", "valueText": "a: b"}));
/// ```
pub fn to_generic_tree(wire: &str) -> Result<serde_json::Value> {
    let quoted = quote_bare_words(wire)?;
    serde_json::from_str(&quoted).map_err(|e| SeekerError::WhereQueryConversion(e.to_string()))
}

fn quote_bare_words(wire: &str) -> Result<String> {
    let chars: Vec<char> = wire.chars().collect();
    let mut out = String::with_capacity(wire.len() + 16);
    let mut expect_operator_value = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => {
                let end = string_end(&chars, i)?;
                out.extend(&chars[i..end]);
                i = end;
                expect_operator_value = false;
            }
            c if c.is_ascii_digit() || c == '-' => {
                let start = i;
                while i < chars.len() && is_number_char(chars[i]) {
                    i += 1;
                }
                out.extend(&chars[start..i]);
                expect_operator_value = false;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if chars.get(i) == Some(&':') {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                    expect_operator_value = word == "operator";
                } else if expect_operator_value {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                    expect_operator_value = false;
                } else {
                    out.push_str(&word);
                }
            }
            c => {
                out.push(c);
                i += 1;
                if !(c == ':' || c.is_whitespace()) {
                    expect_operator_value = false;
                }
            }
        }
    }
    Ok(out)
}

/// Index just past the closing quote of the string starting at `start`.
fn string_end(chars: &[char], start: usize) -> Result<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '"' => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(SeekerError::WhereQueryConversion(
        "unterminated string literal".to_string(),
    ))
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
}
