//! Filter conditions and the tree they compile to.
//!
//! A [`Where`] collects one `where` call: an optional textual condition with
//! `?` placeholders, the values bound to those placeholders, and named
//! equality conditions. [`Where::compile`] turns it into a [`FilterNode`].
//!
//! # Textual grammar
//!
//! ```text
//! condition = leaf | leaf connective condition
//! leaf      = attribute operator "?"
//! connective = "AND" | "OR"          (any letter case, whitespace around)
//! ```
//!
//! There is no grouping. The text is split on its first connective, the left
//! side must be a single leaf and the right side is compiled again, so
//! `a = ? AND b = ? OR c = ?` reads as `a AND (b OR c)`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Map;

use crate::error::{Result, SeekerError};
use crate::meta::META_ATTRIBUTES;
use crate::op::{Connective, Op};
use crate::value::{quote, Literal, Value};

static CONNECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(AND|OR)\s+").expect("connective pattern is valid"));

/// A compiled filter.
///
/// Trees are never edited in place. New conditions are combined with the
/// existing root through [`FilterNode::and`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// `path operator value`
    Comparison {
        attribute: String,
        op: Op,
        value: Literal,
    },
    /// `path IS NULL`
    NullCheck { attribute: String },
    /// Two nodes joined by a connective.
    Logical {
        connective: Connective,
        left: Box<FilterNode>,
        right: Box<FilterNode>,
    },
}

impl FilterNode {
    /// Joins two nodes with `connective`.
    pub fn logical(connective: Connective, left: FilterNode, right: FilterNode) -> Self {
        FilterNode::Logical {
            connective,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Returns `self AND other`.
    pub fn and(self, other: FilterNode) -> Self {
        FilterNode::logical(Connective::And, self, other)
    }

    /// Returns `self OR other`.
    pub fn or(self, other: FilterNode) -> Self {
        FilterNode::logical(Connective::Or, self, other)
    }

    /// Number of comparison and null-check leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            FilterNode::Logical { left, right, .. } => left.leaf_count() + right.leaf_count(),
            _ => 1,
        }
    }

    /// Renders the backend filter grammar.
    ///
    /// ```
    /// use weaviate_seeker::Where;
    ///
    /// let node = Where::text("a = ? AND b = ?").bind(1).bind(2).compile().unwrap();
    /// assert_eq!(
    ///     node.to_wire(),
    ///     r#"{ operator: And, operands: [{ path: ["a"], operator: Equal, valueInt: 1 }, { path: ["b"], operator: Equal, valueInt: 2 }] }"#,
    /// );
    /// ```
    pub fn to_wire(&self) -> String {
        self.to_string()
    }

    /// Converts the tree to the generic nested document used by batch deletes.
    pub fn to_generic(&self) -> serde_json::Value {
        let mut map = Map::new();
        match self {
            FilterNode::Comparison {
                attribute,
                op,
                value,
            } => {
                map.insert("path".into(), serde_json::Value::from(vec![attribute.clone()]));
                map.insert("operator".into(), op.as_str().into());
                map.insert(value.tag().into(), value.to_json());
            }
            FilterNode::NullCheck { attribute } => {
                map.insert("path".into(), serde_json::Value::from(vec![attribute.clone()]));
                map.insert("operator".into(), Op::IsNull.as_str().into());
                map.insert("valueBoolean".into(), true.into());
            }
            FilterNode::Logical {
                connective,
                left,
                right,
            } => {
                map.insert("operator".into(), connective.as_str().into());
                map.insert(
                    "operands".into(),
                    serde_json::Value::Array(vec![left.to_generic(), right.to_generic()]),
                );
            }
        }
        serde_json::Value::Object(map)
    }
}

impl std::fmt::Display for FilterNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterNode::Comparison {
                attribute,
                op,
                value,
            } => write!(
                f,
                "{{ path: [{}], operator: {}, {}: {} }}",
                quote(attribute),
                op,
                value.tag(),
                value.render()
            ),
            FilterNode::NullCheck { attribute } => write!(
                f,
                "{{ path: [{}], operator: IsNull, valueBoolean: true }}",
                quote(attribute)
            ),
            FilterNode::Logical {
                connective,
                left,
                right,
            } => write!(f, "{{ operator: {connective}, operands: [{left}, {right}] }}"),
        }
    }
}

/// Arguments of one `where` call.
///
/// # Example
///
/// ```
/// use weaviate_seeker::Where;
///
/// // Placeholders are filled left to right.
/// let cond = Where::text("author = ? OR title LIKE ?").bind("Ann").bind("*rust*");
/// assert_eq!(cond.compile().unwrap().leaf_count(), 2);
///
/// // Named conditions are equality checks, or CONTAINS_ANY for lists.
/// let cond = Where::new().eq("title", "Dune").eq("tags", vec!["scifi", "classic"]);
/// assert_eq!(cond.compile().unwrap().leaf_count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    text: String,
    values: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl Where {
    /// Creates an empty condition set.
    pub fn new() -> Self {
        Where::default()
    }

    /// Starts from a textual condition with `?` placeholders.
    pub fn text(condition: impl Into<String>) -> Self {
        Where {
            text: condition.into(),
            ..Where::default()
        }
    }

    /// Binds the next positional value.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Adds a named condition.
    pub fn eq(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.push((attribute.into(), value.into()));
        self
    }

    /// Compiles the conditions into a single tree.
    ///
    /// Named conditions are AND-ed left to right, and the result is AND-ed
    /// with the textual condition.
    pub fn compile(&self) -> Result<FilterNode> {
        if self.values.is_empty() && self.named.is_empty() {
            return Err(SeekerError::invalid_where("invalid argument for where query"));
        }
        let placeholders = self.text.split_whitespace().filter(|t| *t == "?").count();
        if placeholders != self.values.len() {
            return Err(SeekerError::invalid_where("invalid number of arguments"));
        }

        let named = self.compile_named()?;
        let mut values = self.values.iter();
        let textual = compile_text(&self.text, &mut values)?;
        if values.next().is_some() {
            return Err(SeekerError::invalid_where("invalid number of arguments"));
        }

        match (named, textual) {
            (Some(named), Some(textual)) => Ok(named.and(textual)),
            (Some(node), None) | (None, Some(node)) => Ok(node),
            (None, None) => Err(SeekerError::invalid_where("invalid argument for where query")),
        }
    }

    fn compile_named(&self) -> Result<Option<FilterNode>> {
        let mut root: Option<FilterNode> = None;
        for (attribute, value) in &self.named {
            let symbol = if value.is_list() { "CONTAINS_ANY" } else { "=" };
            let node = compile_condition(attribute, symbol, value)?;
            root = Some(match root {
                Some(acc) => acc.and(node),
                None => node,
            });
        }
        Ok(root)
    }
}

fn compile_text<'a, I>(text: &str, values: &mut I) -> Result<Option<FilterNode>>
where
    I: Iterator<Item = &'a Value>,
{
    if text.trim().is_empty() {
        return Ok(None);
    }

    let Some(caps) = CONNECTIVE.captures(text) else {
        return compile_leaf(text, values).map(Some);
    };
    // Group 0 and 1 always exist on a match.
    let (Some(whole), Some(keyword)) = (caps.get(0), caps.get(1)) else {
        return Err(SeekerError::invalid_where("unable to process the query"));
    };
    let connective = Connective::from_keyword(keyword.as_str())
        .ok_or_else(|| SeekerError::invalid_where("unable to process the query"))?;

    let left = compile_leaf(&text[..whole.start()], values)?;
    let right = compile_text(&text[whole.end()..], values)?
        .ok_or_else(|| SeekerError::invalid_where("unable to process the query"))?;
    Ok(Some(FilterNode::logical(connective, left, right)))
}

fn compile_leaf<'a, I>(segment: &str, values: &mut I) -> Result<FilterNode>
where
    I: Iterator<Item = &'a Value>,
{
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    let [attribute, symbol, "?"] = tokens.as_slice() else {
        return Err(SeekerError::invalid_where("unable to process the query"));
    };
    let value = values
        .next()
        .ok_or_else(|| SeekerError::invalid_where("insufficient values for formatting"))?;
    compile_condition(attribute, symbol, value)
}

/// Builds one leaf: null check, meta-attribute rename, operator lookup and
/// literal tagging, in that order.
fn compile_condition(attribute: &str, symbol: &str, value: &Value) -> Result<FilterNode> {
    let is_timestamp = META_ATTRIBUTES.is_timestamp(attribute);
    let path = if is_timestamp {
        META_ATTRIBUTES
            .filter_path(attribute)
            .unwrap_or_else(|| attribute.to_string())
    } else {
        attribute.to_string()
    };

    if value.is_null() {
        return Ok(FilterNode::NullCheck { attribute: path });
    }

    let op: Op = symbol.parse()?;
    let literal = if is_timestamp {
        Literal::Text(value.epoch_millis()?.to_string())
    } else {
        Literal::from_value(value)?
    };

    Ok(FilterNode::Comparison {
        attribute: path,
        op,
        value: literal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn wire(cond: Where) -> String {
        cond.compile().unwrap().to_wire()
    }

    #[test]
    fn requires_some_arguments() {
        let err = Where::new().compile().unwrap_err();
        assert_eq!(err.to_string(), "invalid argument for where query");

        let err = Where::text("title = ?").compile().unwrap_err();
        assert_eq!(err.to_string(), "invalid argument for where query");
    }

    #[test]
    fn placeholder_count_must_match() {
        let err = Where::text("author = ?")
            .bind("nobody")
            .bind("test")
            .compile()
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid number of arguments");

        let err = Where::text("a = ? AND b = ?").bind(1).compile().unwrap_err();
        assert!(matches!(err, SeekerError::InvalidWhereQuery(_)));
    }

    #[test]
    fn question_marks_inside_tokens_are_not_placeholders() {
        let err = Where::text("a? = ?").bind(1).bind(2).compile().unwrap_err();
        assert_eq!(err.to_string(), "invalid number of arguments");

        let err = Where::text("? = ?").bind(1).bind(2).compile().unwrap_err();
        assert_eq!(err.to_string(), "invalid number of arguments");

        assert_eq!(
            wire(Where::text("a? = ?").bind(1)),
            r#"{ path: ["a?"], operator: Equal, valueInt: 1 }"#
        );
    }

    #[test]
    fn single_text_leaf() {
        assert_eq!(
            wire(Where::text("title = ?").bind("test")),
            r#"{ path: ["title"], operator: Equal, valueText: "test" }"#
        );
    }

    #[test]
    fn text_connectives() {
        assert_eq!(
            wire(Where::text("content = ? AND title = ?").bind("test").bind("title")),
            r#"{ operator: And, operands: [{ path: ["content"], operator: Equal, valueText: "test" }, { path: ["title"], operator: Equal, valueText: "title" }] }"#
        );
        assert_eq!(
            wire(Where::text("a > ? or b <= ?").bind(1).bind(2.5)),
            r#"{ operator: Or, operands: [{ path: ["a"], operator: GreaterThan, valueInt: 1 }, { path: ["b"], operator: LessThanEqual, valueNumber: 2.5 }] }"#
        );
    }

    #[test]
    fn mixed_connectives_nest_to_the_right() {
        let node = Where::text("a = ? AND b = ? OR c = ?")
            .bind(1)
            .bind(2)
            .bind(3)
            .compile()
            .unwrap();
        let FilterNode::Logical {
            connective, right, ..
        } = node
        else {
            panic!("expected logical root");
        };
        assert_eq!(connective, Connective::And);
        assert!(matches!(
            *right,
            FilterNode::Logical {
                connective: Connective::Or,
                ..
            }
        ));
    }

    #[test]
    fn malformed_leaves() {
        let err = Where::text("content =").bind("x").compile().unwrap_err();
        // one value, zero placeholders
        assert_eq!(err.to_string(), "invalid number of arguments");

        let err = Where::text("content = ? extra")
            .bind("x")
            .compile()
            .unwrap_err();
        assert_eq!(err.to_string(), "unable to process the query");

        let err = Where::text("a = ? AND ").bind(1).compile().unwrap_err();
        assert_eq!(err.to_string(), "unable to process the query");
    }

    #[test]
    fn leaf_without_value_is_rejected() {
        let err = Where::text("content = article")
            .eq("title", "x")
            .compile()
            .unwrap_err();
        assert_eq!(err.to_string(), "unable to process the query");
    }

    #[test]
    fn named_conditions_are_equalities() {
        assert_eq!(
            wire(Where::new().eq("title", "test")),
            r#"{ path: ["title"], operator: Equal, valueText: "test" }"#
        );
        assert_eq!(
            wire(Where::new().eq("tags", vec!["a", "b"])),
            r#"{ path: ["tags"], operator: ContainsAny, valueText: ["a", "b"] }"#
        );
    }

    #[test]
    fn named_then_text() {
        assert_eq!(
            wire(Where::text("content = ?").bind("article").eq("title", "test")),
            r#"{ operator: And, operands: [{ path: ["title"], operator: Equal, valueText: "test" }, { path: ["content"], operator: Equal, valueText: "article" }] }"#
        );
    }

    #[test]
    fn null_value_is_null_check() {
        assert_eq!(
            wire(Where::text("content != ?").bind(Value::Null)),
            r#"{ path: ["content"], operator: IsNull, valueBoolean: true }"#
        );
        // operator is not consulted for null values
        assert_eq!(
            wire(Where::text("content BETWEEN ?").bind(None::<i64>)),
            r#"{ path: ["content"], operator: IsNull, valueBoolean: true }"#
        );
    }

    #[test]
    fn timestamps_are_renamed_and_converted() {
        assert_eq!(
            wire(Where::text("created_at = ?").bind("2020-01-01")),
            r#"{ path: ["_creationTimeUnix"], operator: Equal, valueText: "1577836800000" }"#
        );
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(
            wire(Where::new().eq("updated_at", date)),
            r#"{ path: ["_lastUpdateTimeUnix"], operator: Equal, valueText: "1577836800000" }"#
        );
    }

    #[test]
    fn invalid_operator_and_value_type() {
        let err = Where::text("a BETWEEN ?").bind(1).compile().unwrap_err();
        assert!(matches!(err, SeekerError::InvalidOperator(ref op) if op == "BETWEEN"));

        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let err = Where::text("a = ?").bind(date).compile().unwrap_err();
        assert!(matches!(err, SeekerError::InvalidValueType(_)));
    }

    #[test]
    fn generic_tree_shape() {
        let node = Where::text("a = ? OR b = ?")
            .bind(1)
            .bind(Value::Null)
            .compile()
            .unwrap();
        assert_eq!(
            node.to_generic(),
            json!({
                "operator": "Or",
                "operands": [
                    {"path": ["a"], "operator": "Equal", "valueInt": 1},
                    {"path": ["b"], "operator": "IsNull", "valueBoolean": true}
                ]
            })
        );
    }

    #[test]
    fn and_combines_without_mutation() {
        let first = Where::new().eq("a", 1).compile().unwrap();
        let second = Where::new().eq("b", 2).compile().unwrap();
        let combined = first.clone().and(second.clone());
        assert_eq!(combined.leaf_count(), 2);
        assert_eq!(combined, Where::new().eq("a", 1).eq("b", 2).compile().unwrap());
        assert_eq!(first.leaf_count(), 1);
    }
}
