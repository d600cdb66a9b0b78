//! Static collection descriptors.
//!
//! A query only needs a collection's name and its declared attribute list.
//! [`SchemaRegistry`] reads both out of a backend schema document.

use serde::Deserialize;

use crate::error::{Result, SeekerError};

/// Name and declared attributes of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    name: String,
    attributes: Vec<String>,
}

impl CollectionSchema {
    /// Creates a schema from a collection name and its attribute names.
    pub fn new<I, S>(name: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CollectionSchema {
            name: name.into(),
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared attributes in order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    classes: Vec<ClassDocument>,
}

#[derive(Debug, Deserialize)]
struct ClassDocument {
    class: String,
    #[serde(default)]
    properties: Vec<PropertyDocument>,
}

#[derive(Debug, Deserialize)]
struct PropertyDocument {
    name: String,
}

/// All collections known from a schema document.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    collections: Vec<CollectionSchema>,
}

impl SchemaRegistry {
    /// Reads `{"classes": [{"class": .., "properties": [{"name": ..}]}]}`.
    pub fn from_json(document: &serde_json::Value) -> Result<Self> {
        let doc = SchemaDocument::deserialize(document)
            .map_err(|e| SeekerError::type_mismatch(format!("malformed schema: {e}")))?;
        let collections = doc
            .classes
            .into_iter()
            .map(|class| {
                CollectionSchema::new(class.class, class.properties.into_iter().map(|p| p.name))
            })
            .collect();
        Ok(SchemaRegistry { collections })
    }

    /// Looks up a collection by name.
    pub fn collection(&self, name: &str) -> Result<&CollectionSchema> {
        self.collections
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SeekerError::CollectionNotFound(name.to_string()))
    }

    /// Returns the number of collections.
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns `true` if the registry has no collections.
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_schema_document() {
        let registry = SchemaRegistry::from_json(&json!({
            "classes": [
                {"class": "Article", "properties": [{"name": "title"}, {"name": "content", "dataType": ["text"]}]},
                {"class": "Empty"}
            ]
        }))
        .unwrap();

        assert_eq!(registry.len(), 2);
        let article = registry.collection("Article").unwrap();
        assert_eq!(article.name(), "Article");
        assert_eq!(article.attributes(), ["title", "content"]);
        assert!(registry.collection("Empty").unwrap().attributes().is_empty());
    }

    #[test]
    fn unknown_collection() {
        let registry = SchemaRegistry::from_json(&json!({"classes": []})).unwrap();
        assert!(registry.is_empty());
        let err = registry.collection("Article").unwrap_err();
        assert_eq!(err.to_string(), "Collection Article not found in the schema");
    }

    #[test]
    fn malformed_document() {
        assert!(SchemaRegistry::from_json(&json!({"classes": [{"name": "x"}]})).is_err());
    }
}
