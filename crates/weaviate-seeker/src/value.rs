//! Runtime values bound into filter conditions.
//!
//! [`Value`] is what a caller hands to a condition. Compiling a condition
//! turns it into a [`Literal`], which carries the backend type tag
//! (`valueInt`, `valueText`, ...) and knows how to render itself.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{Result, SeekerError};

/// Value bound to a condition placeholder or a named condition.
///
/// # Example
///
/// ```
/// use weaviate_seeker::Value;
///
/// assert_eq!(Value::from(3), Value::Int(3));
/// assert_eq!(Value::from(None::<&str>), Value::Null);
/// assert_eq!(
///     Value::from(vec!["a", "b"]),
///     Value::List(vec![Value::from("a"), Value::from("b")]),
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value; always compiles to an `IsNull` check.
    Null,
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Text.
    Text(String),
    /// Sequence of values. Only text sequences have a literal tag.
    List(Vec<Value>),
    /// Instant in UTC.
    DateTime(DateTime<Utc>),
    /// Calendar date, read as midnight UTC.
    Date(NaiveDate),
}

impl Value {
    /// Returns the name of this value's runtime type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
        }
    }

    /// Returns `true` if this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if this is a [`Value::List`].
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Converts a date-like value to milliseconds since the Unix epoch.
    ///
    /// Text is accepted in RFC 3339 or `YYYY-MM-DD` form. Integers are taken
    /// to already be epoch milliseconds.
    pub fn epoch_millis(&self) -> Result<i64> {
        match self {
            Value::DateTime(dt) => Ok(dt.timestamp_millis()),
            Value::Date(date) => Ok(midnight_millis(*date)),
            Value::Int(millis) => Ok(*millis),
            Value::Text(text) => parse_date_text(text).ok_or_else(|| {
                SeekerError::InvalidValueType(format!("text '{text}' (expected a date)"))
            }),
            other => Err(SeekerError::InvalidValueType(format!(
                "{} (expected a date)",
                other.type_name()
            ))),
        }
    }
}

fn midnight_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).timestamp_millis())
        .unwrap_or_default()
}

fn parse_date_text(text: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(midnight_millis)
}

/// A comparison value after type tagging.
///
/// Each variant corresponds to one backend value field.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `valueInt`
    Int(i64),
    /// `valueNumber`
    Number(f64),
    /// `valueText`
    Text(String),
    /// `valueText` holding an array of strings.
    TextArray(Vec<String>),
    /// `valueBoolean`
    Boolean(bool),
}

impl Literal {
    /// Tags a runtime value.
    ///
    /// Null, date/time values, non-finite floats and non-text lists have no
    /// tag and are rejected with [`SeekerError::InvalidValueType`].
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int(n) => Ok(Literal::Int(*n)),
            Value::Float(n) if n.is_finite() => Ok(Literal::Number(*n)),
            Value::Float(_) => Err(SeekerError::InvalidValueType(
                "non-finite float".to_string(),
            )),
            Value::Bool(b) => Ok(Literal::Boolean(*b)),
            Value::Text(s) => Ok(Literal::Text(s.clone())),
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::Text(s) => Ok(s.clone()),
                    other => Err(SeekerError::InvalidValueType(format!(
                        "list of {}",
                        other.type_name()
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Literal::TextArray),
            other => Err(SeekerError::InvalidValueType(other.type_name().to_string())),
        }
    }

    /// Returns the backend value field for this literal.
    pub fn tag(&self) -> &'static str {
        match self {
            Literal::Int(_) => "valueInt",
            Literal::Number(_) => "valueNumber",
            Literal::Text(_) | Literal::TextArray(_) => "valueText",
            Literal::Boolean(_) => "valueBoolean",
        }
    }

    /// Renders the literal in the wire grammar.
    pub fn render(&self) -> String {
        match self {
            Literal::Int(n) => n.to_string(),
            Literal::Number(n) => format_float(*n),
            Literal::Text(s) => quote(s),
            Literal::TextArray(items) => quote_list(items),
            Literal::Boolean(b) => b.to_string(),
        }
    }

    /// Converts the literal to a generic JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Literal::Int(n) => serde_json::Value::from(*n),
            Literal::Number(n) => serde_json::Value::from(*n),
            Literal::Text(s) => serde_json::Value::from(s.as_str()),
            Literal::TextArray(items) => serde_json::Value::from(items.clone()),
            Literal::Boolean(b) => serde_json::Value::from(*b),
        }
    }
}

/// Quotes and escapes a string for the wire grammar.
pub(crate) fn quote(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Renders `["a", "b"]`.
pub(crate) fn quote_list<S: AsRef<str>>(items: &[S]) -> String {
    let inner: Vec<String> = items.iter().map(|s| quote(s.as_ref())).collect();
    format!("[{}]", inner.join(", "))
}

/// Renders a float so that it always reads back as a float.
///
/// Whole numbers keep a trailing `.0`, and from 1e16 up they switch to
/// exponent form.
pub(crate) fn format_float(n: f64) -> String {
    if !n.is_finite() || n.fract() != 0.0 {
        n.to_string()
    } else if n.abs() < 1e16 {
        format!("{n:.1}")
    } else {
        format!("{n:e}")
    }
}

// Conversions from common types to Value

impl From<i8> for Value {
    fn from(n: i8) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i16> for Value {
    fn from(n: i16) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(date)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
