//! Query defaults.

use crate::error::{Result, SeekerError};

/// Environment variable holding the default similarity distance.
pub const DISTANCE_ENV: &str = "WEAVIATE_SIMILARITY_DISTANCE";
/// Environment variable holding the default page size.
pub const PAGE_SIZE_ENV: &str = "QUERY_DEFAULTS_LIMIT";

/// Defaults injected into every [`QuerySpec`](crate::QuerySpec).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryConfig {
    /// Distance used by similarity searches that do not pass one.
    pub similarity_distance: f64,
    /// Initial `limit` of a new query.
    pub page_size: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            similarity_distance: 0.55,
            page_size: 25,
        }
    }
}

impl QueryConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads overrides through `lookup`; unset names keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = QueryConfig::default();

        if let Some(raw) = lookup(DISTANCE_ENV) {
            let distance: f64 = raw
                .trim()
                .parse()
                .map_err(|_| SeekerError::config(DISTANCE_ENV, format!("'{raw}' is not a number")))?;
            if !distance.is_finite() {
                return Err(SeekerError::config(DISTANCE_ENV, "distance must be finite"));
            }
            config.similarity_distance = distance;
        }

        if let Some(raw) = lookup(PAGE_SIZE_ENV) {
            config.page_size = raw.trim().parse().map_err(|_| {
                SeekerError::config(PAGE_SIZE_ENV, format!("'{raw}' is not a page size"))
            })?;
        }

        Ok(config)
    }
}
