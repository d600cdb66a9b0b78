//! Logical names for backend meta-attributes.
//!
//! Backend meta fields (`creationTimeUnix`, ...) live outside the declared
//! schema and use camelCase names. Callers address them by the snake_case
//! names in [`MetaAttributeMap`]. Every compiler consults the same table.

/// Fixed two-way dictionary between logical and backend meta-attribute names.
#[derive(Debug, Clone, Copy)]
pub struct MetaAttributeMap {
    entries: &'static [(&'static str, &'static str)],
}

/// The dictionary used throughout the crate.
pub const META_ATTRIBUTES: MetaAttributeMap = MetaAttributeMap {
    entries: &[
        ("feature_projection", "featureProjection"),
        ("created_at", "creationTimeUnix"),
        ("updated_at", "lastUpdateTimeUnix"),
    ],
};

/// Logical names whose comparison values are converted to epoch milliseconds.
const TIMESTAMP_ATTRIBUTES: [&str; 2] = ["created_at", "updated_at"];

impl MetaAttributeMap {
    /// Returns the backend name for a logical meta-attribute.
    pub fn backend_name(&self, logical: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(name, _)| *name == logical)
            .map(|(_, backend)| *backend)
    }

    /// Returns the logical name for a backend meta field.
    pub fn logical_name(&self, backend: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, name)| *name == backend)
            .map(|(logical, _)| *logical)
    }

    /// Returns `true` if `logical` is a timestamp meta-attribute.
    pub fn is_timestamp(&self, logical: &str) -> bool {
        TIMESTAMP_ATTRIBUTES.contains(&logical)
    }

    /// Backend path used in filters and sort specs (`_` + backend name).
    pub fn filter_path(&self, logical: &str) -> Option<String> {
        self.backend_name(logical).map(|name| format!("_{name}"))
    }

    /// Iterates `(logical, backend)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_both_directions() {
        assert_eq!(
            META_ATTRIBUTES.backend_name("created_at"),
            Some("creationTimeUnix")
        );
        assert_eq!(
            META_ATTRIBUTES.logical_name("lastUpdateTimeUnix"),
            Some("updated_at")
        );
        assert_eq!(META_ATTRIBUTES.backend_name("title"), None);
    }

    #[test]
    fn filter_path_is_underscore_prefixed() {
        assert_eq!(
            META_ATTRIBUTES.filter_path("updated_at").as_deref(),
            Some("_lastUpdateTimeUnix")
        );
        assert_eq!(
            META_ATTRIBUTES.filter_path("feature_projection").as_deref(),
            Some("_featureProjection")
        );
    }

    #[test]
    fn only_creation_and_update_are_timestamps() {
        assert!(META_ATTRIBUTES.is_timestamp("created_at"));
        assert!(META_ATTRIBUTES.is_timestamp("updated_at"));
        assert!(!META_ATTRIBUTES.is_timestamp("feature_projection"));
    }
}
