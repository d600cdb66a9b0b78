//! Records returned by a fetch.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::meta::META_ATTRIBUTES;
use crate::similarity::Entity;

/// Key of the nested meta-block in backend records.
pub const ADDITIONAL_KEY: &str = "_additional";

/// One fetched object.
///
/// Declared attributes and the `_additional` meta-block are kept apart.
/// Backend timestamp fields are exposed under their logical names.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    attributes: Map<String, JsonValue>,
    additional: Map<String, JsonValue>,
    custom_selected: bool,
}

impl Record {
    /// Splits a raw backend map into attributes and meta-block.
    pub fn from_raw(mut raw: Map<String, JsonValue>, custom_selected: bool) -> Self {
        let mut additional = match raw.remove(ADDITIONAL_KEY) {
            Some(JsonValue::Object(map)) => map,
            _ => Map::new(),
        };
        for (logical, backend) in META_ATTRIBUTES.iter() {
            if let Some(value) = additional.remove(backend) {
                additional.insert(logical.to_string(), value);
            }
        }
        Record {
            attributes: raw,
            additional,
            custom_selected,
        }
    }

    /// Returns a declared attribute.
    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.attributes.get(name)
    }

    /// Returns all declared attributes.
    pub fn attributes(&self) -> &Map<String, JsonValue> {
        &self.attributes
    }

    /// Returns a meta-attribute by logical name (`id`, `created_at`, `distance`, ...).
    pub fn additional(&self, name: &str) -> Option<&JsonValue> {
        self.additional.get(name)
    }

    /// `true` when the query that produced this record had an explicit selection.
    pub fn is_custom_selected(&self) -> bool {
        self.custom_selected
    }

    /// Returns the record id, if present and a valid UUID.
    pub fn id(&self) -> Option<Uuid> {
        self.additional
            .get("id")
            .and_then(JsonValue::as_str)
            .and_then(|id| Uuid::parse_str(id).ok())
    }

    /// Returns the creation time, if present.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("created_at")
    }

    /// Returns the last update time, if present.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("updated_at")
    }

    // The backend sends epoch milliseconds, usually as a string.
    fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        let millis = match self.additional.get(name)? {
            JsonValue::String(s) => s.parse::<i64>().ok()?,
            JsonValue::Number(n) => n.as_i64()?,
            _ => return None,
        };
        DateTime::<Utc>::from_timestamp_millis(millis)
    }
}

impl Entity for Record {
    fn entity_id(&self) -> Option<String> {
        self.id().map(|id| id.hyphenated().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn splits_meta_block() {
        let record = Record::from_raw(
            raw(json!({
                "title": "Dune",
                "_additional": {
                    "id": "983c0970-2c65-4c38-a93f-2ca9272d784b",
                    "creationTimeUnix": "1577836800000",
                    "lastUpdateTimeUnix": 1577836800001i64,
                    "distance": 0.12
                }
            })),
            false,
        );

        assert_eq!(record.get("title"), Some(&json!("Dune")));
        assert!(record.get(ADDITIONAL_KEY).is_none());
        assert_eq!(
            record.id().unwrap().to_string(),
            "983c0970-2c65-4c38-a93f-2ca9272d784b"
        );
        assert_eq!(record.created_at().unwrap().timestamp_millis(), 1577836800000);
        assert_eq!(record.updated_at().unwrap().timestamp_millis(), 1577836800001);
        assert_eq!(record.additional("distance"), Some(&json!(0.12)));
        assert!(record.additional("creationTimeUnix").is_none());
        assert!(!record.is_custom_selected());
    }

    #[test]
    fn missing_meta_block() {
        let record = Record::from_raw(raw(json!({"title": "x"})), true);
        assert!(record.id().is_none());
        assert!(record.created_at().is_none());
        assert!(record.entity_id().is_none());
        assert!(record.is_custom_selected());
    }

    #[test]
    fn record_is_an_entity() {
        let record = Record::from_raw(
            raw(json!({"_additional": {"id": "0476e426-7e7f-4010-bfad-20c57a65c5c7"}})),
            false,
        );
        assert_eq!(
            record.entity_id().as_deref(),
            Some("0476e426-7e7f-4010-bfad-20c57a65c5c7")
        );
    }
}
