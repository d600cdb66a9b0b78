//! Seeker - Fluent query-specification compiler for Weaviate collections.
//!
//! Seeker accumulates the parts of a Weaviate query through a builder API
//! and lowers them into the string fragments the backend's query language
//! expects. It supports:
//!
//! - Textual and named conditions compiled into a filter tree
//! - Multi-field ordering with ascending/descending
//! - Flat and nested field selection
//! - Similarity search by text, vector or object, keyword search and questions
//! - Pagination with limit and offset
//! - Lazy, cached reads plus count and batch delete through a [`Transport`]
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use weaviate_seeker::{CollectionSchema, MockTransport, QueryConfig, QuerySpec, Where};
//!
//! let schema = CollectionSchema::new("Article", ["title", "content"]);
//! let transport = MockTransport::new();
//! let mut query = QuerySpec::new(schema, QueryConfig::default(), &transport);
//!
//! query
//!     .filter(Where::text("title = ? AND views > ?").bind("Dune").bind(100))
//!     .unwrap()
//!     .order(&[], &[("created_at", "desc")])
//!     .unwrap()
//!     .near_text(&["desert planet"], None)
//!     .unwrap();
//!
//! let compiled = query.compile().unwrap();
//! assert_eq!(
//!     serde_json::to_value(&compiled).unwrap(),
//!     json!({
//!         "className": "Article",
//!         "limit": "25",
//!         "offset": "0",
//!         "fields": "title content _additional { id creationTimeUnix lastUpdateTimeUnix }",
//!         "nearText": r#"{ concepts: ["desert planet"], distance: 0.55 }"#,
//!         "where": r#"{ operator: And, operands: [{ path: ["title"], operator: Equal, valueText: "Dune" }, { path: ["views"], operator: GreaterThan, valueInt: 100 }] }"#,
//!         "sort": r#"{ path: ["_creationTimeUnix"], order: desc }"#,
//!     })
//! );
//! ```
//!
//! # Query Semantics
//!
//! Every builder call adds to what is already there:
//!
//! - **filter**: the new tree is AND-ed with the existing root
//! - **order**: specs are appended in call order
//! - **select**: flat names are deduplicated, nested keys merge
//! - **near_text**: phrases accumulate, the distance is replaced
//! - **near_vector / near_object / bm25 / ask**: replaced
//! - **limit / offset**: replaced
//!
//! A textual condition has no parentheses. It splits on the first ` AND ` or
//! ` OR ` and folds to the right, so `a = ? AND b = ? OR c = ?` reads as
//! `a AND (b OR c)`.
//!
//! # Operators
//!
//! | Symbol | Operator |
//! |--------|----------|
//! | `=`, `==` | `Equal` |
//! | `!=` | `NotEqual` |
//! | `>`, `<`, `>=`, `<=` | `GreaterThan`, `LessThan`, `GreaterThanEqual`, `LessThanEqual` |
//! | `LIKE` | `Like` |
//! | `CONTAINS_ANY`, `CONTAINS_ALL` | `ContainsAny`, `ContainsAll` |
//!
//! A `None` value always becomes an `IsNull` check, whatever the symbol.

mod config;
mod error;
mod filter;
mod generic;
mod meta;
mod op;
mod ordering;
mod projection;
mod query;
mod record;
mod schema;
mod similarity;
mod transport;
mod value;

// Re-export public API
pub use config::{QueryConfig, DISTANCE_ENV, PAGE_SIZE_ENV};
pub use error::{Result, SeekerError};
pub use filter::{FilterNode, Where};
pub use generic::to_generic_tree;
pub use meta::{MetaAttributeMap, META_ATTRIBUTES};
pub use op::{Connective, Op};
pub use ordering::{Dir, OrderBy, SortSpec};
pub use projection::{Projection, DEFAULT_META_BLOCK};
pub use query::QuerySpec;
pub use record::{Record, ADDITIONAL_KEY};
pub use schema::{CollectionSchema, SchemaRegistry};
pub use similarity::{Entity, Similarity};
pub use transport::{
    AggregateQuery, BatchDelete, CompiledQuery, DeleteSummary, MockTransport, Request, Transport,
    COUNT_FIELDS,
};
pub use value::{Literal, Value};
