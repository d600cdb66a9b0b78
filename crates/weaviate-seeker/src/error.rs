//! Error types for the seeker crate.

use thiserror::Error;

/// Errors raised while building, compiling or executing a query.
///
/// Builder errors are returned before any state changes, so the same call
/// can be retried with corrected arguments. `Server` and `Connection` only
/// surface once a read, count or delete actually reaches the backend.
#[derive(Debug, Error)]
pub enum SeekerError {
    /// Builder arguments are missing or contradictory.
    #[error("invalid arguments: {0}")]
    ArgumentShape(String),

    /// A value has the wrong runtime type for where it was used.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Comparison operator is not in the operator table.
    #[error("Invalid conditional operator {0}")]
    InvalidOperator(String),

    /// Comparison value has no backend literal tag.
    #[error("Invalid value type {0} for comparison")]
    InvalidValueType(String),

    /// Sort direction is neither `asc` nor `desc`.
    #[error("invalid sorting order: {0}")]
    SortingOption(String),

    /// Textual condition or its bound values are malformed.
    #[error("{0}")]
    InvalidWhereQuery(String),

    /// A serialized filter could not be read back.
    #[error("unable to convert where query: {0}")]
    WhereQueryConversion(String),

    /// Keyword search or question text is empty.
    #[error("text cannot be empty")]
    EmptyPrompt,

    /// A batch delete was requested without any filter.
    #[error("where condition is required for destroy_all")]
    MissingWhereCondition,

    /// The backend reported a failure.
    #[error("server error: {0}")]
    Server(String),

    /// The backend could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// Collection is not declared in the schema.
    #[error("Collection {0} not found in the schema")]
    CollectionNotFound(String),

    /// Configuration value could not be parsed.
    #[error("invalid configuration for {key}: {reason}")]
    Config { key: String, reason: String },
}

impl SeekerError {
    /// Create a type mismatch error.
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Create an invalid where query error.
    pub fn invalid_where(msg: impl Into<String>) -> Self {
        Self::InvalidWhereQuery(msg.into())
    }

    /// Create a server error.
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Create a configuration error.
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for seeker operations.
pub type Result<T> = std::result::Result<T, SeekerError>;
