//! Comparison and logical operators for filter conditions.
//!
//! [`Op`] covers the comparison operators the backend understands, and
//! [`Connective`] the two ways filter nodes are combined.

use std::str::FromStr;

use crate::error::SeekerError;

/// Comparison operator for a filter leaf.
///
/// Textual conditions name operators by symbol; see [`Op::from_symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `=` or `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `>=`
    GreaterThanEqual,
    /// `<=`
    LessThanEqual,
    /// `LIKE` (wildcard text match)
    Like,
    /// `CONTAINS_ANY`
    ContainsAny,
    /// `CONTAINS_ALL`
    ContainsAll,
    /// Emitted for null checks; has no textual symbol.
    IsNull,
}

impl Op {
    /// Looks up the operator for a textual symbol.
    ///
    /// Symbols are matched exactly, so `like` is not `LIKE`.
    pub fn from_symbol(symbol: &str) -> Option<Op> {
        let op = match symbol {
            "=" | "==" => Op::Equal,
            "!=" => Op::NotEqual,
            ">" => Op::GreaterThan,
            "<" => Op::LessThan,
            ">=" => Op::GreaterThanEqual,
            "<=" => Op::LessThanEqual,
            "LIKE" => Op::Like,
            "CONTAINS_ANY" => Op::ContainsAny,
            "CONTAINS_ALL" => Op::ContainsAll,
            _ => return None,
        };
        Some(op)
    }

    /// Returns the backend name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Equal => "Equal",
            Op::NotEqual => "NotEqual",
            Op::GreaterThan => "GreaterThan",
            Op::LessThan => "LessThan",
            Op::GreaterThanEqual => "GreaterThanEqual",
            Op::LessThanEqual => "LessThanEqual",
            Op::Like => "Like",
            Op::ContainsAny => "ContainsAny",
            Op::ContainsAll => "ContainsAll",
            Op::IsNull => "IsNull",
        }
    }
}

impl FromStr for Op {
    type Err = SeekerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Op::from_symbol(s).ok_or_else(|| SeekerError::InvalidOperator(s.to_string()))
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Logical connective joining two filter nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    /// Both sides must match.
    And,
    /// Either side must match.
    Or,
}

impl Connective {
    /// Parses `AND`/`OR` in any letter case.
    pub fn from_keyword(keyword: &str) -> Option<Connective> {
        if keyword.eq_ignore_ascii_case("and") {
            Some(Connective::And)
        } else if keyword.eq_ignore_ascii_case("or") {
            Some(Connective::Or)
        } else {
            None
        }
    }

    /// Returns the capitalized backend name.
    pub fn as_str(self) -> &'static str {
        match self {
            Connective::And => "And",
            Connective::Or => "Or",
        }
    }
}

impl std::fmt::Display for Connective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
