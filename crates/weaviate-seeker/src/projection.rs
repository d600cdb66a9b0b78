//! Field selection.
//!
//! [`Projection`] accumulates flat attribute names and nested selections
//! across `select` calls, and renders them into the backend's field list.

use serde_json::{Map, Value as JsonValue};

use crate::error::{Result, SeekerError};
use crate::meta::META_ATTRIBUTES;

/// Meta-block requested when nothing was selected explicitly.
pub const DEFAULT_META_BLOCK: &str = "_additional { id creationTimeUnix lastUpdateTimeUnix }";

/// Selected fields.
///
/// Flat names are kept in first-seen order without duplicates. Nested
/// selections are a JSON object whose keys merge across calls, later values
/// replacing earlier ones.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use weaviate_seeker::Projection;
///
/// let mut projection = Projection::new();
/// projection.select(&["title", "content"], None).unwrap();
/// projection.select(&[], Some(json!({"_additional": ["id", "created_at"]}))).unwrap();
///
/// assert_eq!(
///     projection.render::<&str>(&[]).unwrap(),
///     "title content _additional { id creationTimeUnix }",
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    attributes: Vec<String>,
    nested: Map<String, JsonValue>,
}

impl Projection {
    /// Creates an empty projection.
    pub fn new() -> Self {
        Projection::default()
    }

    /// Returns `true` if nothing has been selected.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.nested.is_empty()
    }

    /// Returns the flat attribute names.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Adds flat attributes and an optional nested selection.
    ///
    /// `nested` must be a JSON object. Leaves may be strings, arrays or
    /// objects; anything else is a [`SeekerError::TypeMismatch`]. The
    /// merged result is rendered before it is stored, so a failing call
    /// leaves the projection as it was.
    pub fn select(&mut self, attributes: &[&str], nested: Option<JsonValue>) -> Result<()> {
        let mut candidate = self.clone();
        for attribute in attributes {
            if !candidate.attributes.iter().any(|a| a == attribute) {
                candidate.attributes.push((*attribute).to_string());
            }
        }
        match nested {
            None => {}
            Some(JsonValue::Object(map)) => candidate.nested.extend(map),
            Some(other) => {
                return Err(SeekerError::type_mismatch(format!(
                    "nested selection must be an object, got {}",
                    json_type(&other)
                )))
            }
        }
        candidate.render_selected()?;
        *self = candidate;
        Ok(())
    }

    /// Renders the field list.
    ///
    /// With nothing selected this is `default_attributes` followed by
    /// [`DEFAULT_META_BLOCK`]. Otherwise it is the explicit selection, with
    /// logical meta-attribute names replaced by backend names.
    pub fn render<S: AsRef<str>>(&self, default_attributes: &[S]) -> Result<String> {
        if self.is_empty() {
            let mut parts: Vec<&str> = default_attributes.iter().map(AsRef::as_ref).collect();
            parts.push(DEFAULT_META_BLOCK);
            return Ok(parts.join(" "));
        }
        let rendered = self.render_selected()?;
        Ok(rendered
            .split(' ')
            .map(|token| META_ATTRIBUTES.backend_name(token).unwrap_or(token))
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn render_selected(&self) -> Result<String> {
        let mut parts = Vec::new();
        if !self.attributes.is_empty() {
            parts.push(self.attributes.join(" "));
        }
        if !self.nested.is_empty() {
            parts.push(render_object(&self.nested)?);
        }
        Ok(parts.join(" "))
    }
}

/// `key { children } key { children }`
fn render_object(map: &Map<String, JsonValue>) -> Result<String> {
    let mut parts = Vec::with_capacity(map.len());
    for (key, value) in map {
        parts.push(format!("{key} {{ {} }}", render_value(value)?));
    }
    Ok(parts.join(" "))
}

fn render_value(value: &JsonValue) -> Result<String> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Array(items) => Ok(items
            .iter()
            .map(render_value)
            .collect::<Result<Vec<_>>>()?
            .join(" ")),
        JsonValue::Object(map) => render_object(map),
        other => Err(SeekerError::type_mismatch(format!(
            "cannot select a {} value",
            json_type(other)
        ))),
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
