//! Query builder and executor.
//!
//! [`QuerySpec`] accumulates filter, sort, projection, paging and search
//! directives for one collection. It lowers them into a [`CompiledQuery`]
//! only when a read needs records, and caches the records until the next
//! builder call.

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::config::QueryConfig;
use crate::error::{Result, SeekerError};
use crate::filter::{FilterNode, Where};
use crate::ordering::{Dir, OrderBy, SortSpec};
use crate::projection::Projection;
use crate::record::Record;
use crate::schema::{CollectionSchema, SchemaRegistry};
use crate::similarity::{Entity, Similarity};
use crate::transport::{
    AggregateQuery, BatchDelete, CompiledQuery, DeleteSummary, Transport, COUNT_FIELDS,
};

/// A query against one collection.
///
/// Builder methods validate their arguments before changing anything, so a
/// failed call leaves the query as it was. A successful call drops any
/// loaded records. Reads load at most once until then.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use weaviate_seeker::{CollectionSchema, MockTransport, QueryConfig, QuerySpec, Where};
///
/// let schema = CollectionSchema::new("Article", ["title", "content"]);
/// let transport = MockTransport::new().with_records(json!([{"title": "Dune"}]));
/// let mut query = QuerySpec::new(schema, QueryConfig::default(), &transport);
///
/// query
///     .filter(Where::text("title = ?").bind("Dune")).unwrap()
///     .order(&["title"], &[]).unwrap()
///     .limit(5).unwrap();
///
/// let compiled = query.compile().unwrap();
/// assert_eq!(compiled.limit, "5");
/// assert_eq!(
///     compiled.filter.as_deref(),
///     Some(r#"{ path: ["title"], operator: Equal, valueText: "Dune" }"#),
/// );
///
/// assert_eq!(query.len().unwrap(), 1);
/// assert_eq!(query.first().unwrap().unwrap().get("title"), Some(&json!("Dune")));
/// assert_eq!(transport.get_calls(), 1);
/// ```
#[derive(Debug)]
pub struct QuerySpec<T> {
    collection: CollectionSchema,
    config: QueryConfig,
    transport: T,
    filter: Option<FilterNode>,
    sort: SortSpec,
    projection: Projection,
    similarity: Similarity,
    limit: String,
    offset: String,
    cache: Option<Vec<Record>>,
}

impl<T: Transport> QuerySpec<T> {
    /// Creates an unloaded query with the configured page size.
    pub fn new(collection: CollectionSchema, config: QueryConfig, transport: T) -> Self {
        QuerySpec {
            collection,
            config,
            transport,
            filter: None,
            sort: SortSpec::new(),
            projection: Projection::new(),
            similarity: Similarity::new(),
            limit: config.page_size.to_string(),
            offset: "0".to_string(),
            cache: None,
        }
    }

    /// Creates a query for a collection declared in `registry`.
    pub fn for_collection(
        registry: &SchemaRegistry,
        name: &str,
        config: QueryConfig,
        transport: T,
    ) -> Result<Self> {
        let collection = registry.collection(name)?.clone();
        Ok(Self::new(collection, config, transport))
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    /// Adds a condition. It is AND-ed with any earlier condition.
    pub fn filter(&mut self, condition: Where) -> Result<&mut Self> {
        let node = condition.compile()?;
        self.filter = Some(match self.filter.take() {
            Some(root) => root.and(node),
            None => node,
        });
        self.invalidate("filter");
        Ok(self)
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Adds sort specs: bare attributes ascending, then labeled pairs.
    ///
    /// ```
    /// # use weaviate_seeker::{CollectionSchema, MockTransport, QueryConfig, QuerySpec};
    /// # let mut query = QuerySpec::new(
    /// #     CollectionSchema::new("Article", ["title"]), QueryConfig::default(), MockTransport::new());
    /// query.order(&["title"], &[("created_at", "desc")]).unwrap();
    /// assert_eq!(
    ///     query.compile().unwrap().sort.unwrap(),
    ///     r#"[ { path: ["title"], order: asc }, { path: ["_creationTimeUnix"], order: desc } ]"#,
    /// );
    /// ```
    pub fn order(&mut self, attributes: &[&str], directed: &[(&str, &str)]) -> Result<&mut Self> {
        let specs = SortSpec::prepare(attributes, directed)?;
        self.sort.extend(specs);
        self.invalidate("order");
        Ok(self)
    }

    /// Adds one sort spec.
    pub fn order_by(&mut self, attribute: &str, dir: Dir) -> Result<&mut Self> {
        let spec = OrderBy::new(attribute, dir)?;
        self.sort.extend([spec]);
        self.invalidate("order");
        Ok(self)
    }

    /// Adds an ascending sort spec.
    pub fn order_asc(&mut self, attribute: &str) -> Result<&mut Self> {
        self.order_by(attribute, Dir::Asc)
    }

    /// Adds a descending sort spec.
    pub fn order_desc(&mut self, attribute: &str) -> Result<&mut Self> {
        self.order_by(attribute, Dir::Desc)
    }

    // ========================================================================
    // Projection
    // ========================================================================

    /// Selects flat attributes and an optional nested JSON selection.
    pub fn select(&mut self, attributes: &[&str], nested: Option<JsonValue>) -> Result<&mut Self> {
        self.projection.select(attributes, nested)?;
        self.invalidate("select");
        Ok(self)
    }

    // ========================================================================
    // Paging
    // ========================================================================

    /// Sets the page size. The value must print as a canonical
    /// non-negative integer.
    pub fn limit(&mut self, value: impl ToString) -> Result<&mut Self> {
        self.limit = canonical_count("limit", value.to_string())?;
        self.invalidate("limit");
        Ok(self)
    }

    /// Sets the number of records to skip.
    pub fn offset(&mut self, value: impl ToString) -> Result<&mut Self> {
        self.offset = canonical_count("offset", value.to_string())?;
        self.invalidate("offset");
        Ok(self)
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Adds text concepts. `None` uses the configured distance.
    pub fn near_text(&mut self, phrases: &[&str], distance: Option<f64>) -> Result<&mut Self> {
        if phrases.is_empty() {
            return Err(SeekerError::ArgumentShape(
                "near_text expects at least one phrase".to_string(),
            ));
        }
        let distance = self.distance(distance);
        self.similarity.near_text(phrases, distance)?;
        self.invalidate("near_text");
        Ok(self)
    }

    /// Replaces the search vector.
    pub fn near_vector(&mut self, vector: &[f64], distance: Option<f64>) -> Result<&mut Self> {
        let distance = self.distance(distance);
        self.similarity.near_vector(vector, distance)?;
        self.invalidate("near_vector");
        Ok(self)
    }

    /// Replaces the reference object by id.
    pub fn near_object_id(&mut self, id: &str, distance: Option<f64>) -> Result<&mut Self> {
        let distance = self.distance(distance);
        self.similarity.near_object_id(id, distance)?;
        self.invalidate("near_object");
        Ok(self)
    }

    /// Replaces the reference object by entity.
    pub fn near_object<E: Entity + ?Sized>(
        &mut self,
        entity: &E,
        distance: Option<f64>,
    ) -> Result<&mut Self> {
        let distance = self.distance(distance);
        self.similarity.near_object(entity, distance)?;
        self.invalidate("near_object");
        Ok(self)
    }

    /// Sets a keyword search. While it is set, sorting is not sent.
    pub fn bm25(&mut self, text: &str, properties: &[&str]) -> Result<&mut Self> {
        self.similarity.bm25(text, properties)?;
        self.invalidate("bm25");
        Ok(self)
    }

    /// Sets a question for question answering.
    pub fn ask(&mut self, question: &str, properties: &[&str]) -> Result<&mut Self> {
        self.similarity.ask(question, properties)?;
        self.invalidate("ask");
        Ok(self)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns the collection this query targets.
    pub fn collection(&self) -> &CollectionSchema {
        &self.collection
    }

    /// Returns the accumulated filter tree.
    pub fn filter_root(&self) -> Option<&FilterNode> {
        self.filter.as_ref()
    }

    /// Returns the accumulated sort specs.
    pub fn orderings(&self) -> &[OrderBy] {
        self.sort.orderings()
    }

    /// Returns the accumulated field selection.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Returns `true` while cached records are valid.
    pub fn is_loaded(&self) -> bool {
        self.cache.is_some()
    }

    // ========================================================================
    // Compilation
    // ========================================================================

    /// Lowers the accumulated state into the fetch parameter bag.
    pub fn compile(&self) -> Result<CompiledQuery> {
        // The backend rejects sort next to bm25.
        let sort = if self.similarity.has_keyword_search() {
            None
        } else {
            self.sort.render()
        };
        Ok(CompiledQuery {
            class_name: self.collection.name().to_string(),
            limit: self.limit.clone(),
            offset: self.offset.clone(),
            fields: self.projection.render(self.collection.attributes())?,
            near_text: self.similarity.render_near_text(),
            near_vector: self.similarity.render_near_vector(),
            near_object: self.similarity.render_near_object(),
            bm25: self.similarity.render_bm25(),
            filter: self.filter.as_ref().map(FilterNode::to_wire),
            sort,
            ask: self.similarity.render_ask(),
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Returns the records, fetching them if needed.
    pub fn records(&mut self) -> Result<&[Record]> {
        if self.cache.is_none() {
            let query = self.compile()?;
            tracing::debug!(
                class = %query.class_name,
                limit = %query.limit,
                offset = %query.offset,
                filtered = query.filter.is_some(),
                "Fetching records"
            );
            let custom_selected = !self.projection.is_empty();
            let records = self
                .transport
                .get(&query)?
                .into_iter()
                .map(|raw| Record::from_raw(raw, custom_selected))
                .collect();
            self.cache = Some(records);
        }
        Ok(self.cache.as_deref().unwrap_or_default())
    }

    /// Iterates over the records, fetching them if needed.
    pub fn iter(&mut self) -> Result<std::slice::Iter<'_, Record>> {
        Ok(self.records()?.iter())
    }

    /// Returns the first record, if any.
    pub fn first(&mut self) -> Result<Option<&Record>> {
        Ok(self.records()?.first())
    }

    /// Returns the last record, if any.
    pub fn last(&mut self) -> Result<Option<&Record>> {
        Ok(self.records()?.last())
    }

    /// Returns the record at `index`, if any.
    pub fn get(&mut self, index: usize) -> Result<Option<&Record>> {
        Ok(self.records()?.get(index))
    }

    /// Returns the number of fetched records.
    pub fn len(&mut self) -> Result<usize> {
        Ok(self.records()?.len())
    }

    /// Returns `true` if the fetch returned no records.
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.records()?.is_empty())
    }

    /// Clones the records out of the cache.
    pub fn to_vec(&mut self) -> Result<Vec<Record>> {
        Ok(self.records()?.to_vec())
    }

    /// Counts matching records without touching the cache.
    ///
    /// Only the filter and vector searches are sent; paging, sorting,
    /// projection and keyword search do not apply to aggregates.
    pub fn count(&self) -> Result<u64> {
        let query = AggregateQuery {
            class_name: self.collection.name().to_string(),
            fields: COUNT_FIELDS.to_string(),
            near_text: self.similarity.render_near_text(),
            near_vector: self.similarity.render_near_vector(),
            near_object: self.similarity.render_near_object(),
            filter: self.filter.as_ref().map(FilterNode::to_wire),
        };
        tracing::debug!(
            class = %query.class_name,
            filtered = query.filter.is_some(),
            "Counting records"
        );
        self.transport.aggregate(&query)
    }

    /// Deletes every record matching the filter.
    ///
    /// Fails with [`SeekerError::MissingWhereCondition`] before contacting
    /// the backend when no filter was given. Loaded records are dropped
    /// once the delete succeeds.
    pub fn destroy_all(&mut self) -> Result<DeleteSummary> {
        let root = self
            .filter
            .as_ref()
            .ok_or(SeekerError::MissingWhereCondition)?;
        let request = BatchDelete {
            class_name: self.collection.name().to_string(),
            filter: root.to_generic(),
        };
        tracing::debug!(
            class = %request.class_name,
            leaves = root.leaf_count(),
            "Deleting records"
        );
        let body = self.transport.batch_delete(&request)?;
        let summary = read_delete_response(&request.class_name, body)?;
        self.invalidate("destroy_all");
        Ok(summary)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn distance(&self, distance: Option<f64>) -> f64 {
        distance.unwrap_or(self.config.similarity_distance)
    }

    fn invalidate(&mut self, call: &'static str) {
        if let Some(records) = self.cache.take() {
            tracing::trace!(
                class = %self.collection.name(),
                call,
                dropped = records.len(),
                "Query changed, dropping loaded records"
            );
        }
    }
}

fn canonical_count(what: &str, raw: String) -> Result<String> {
    match raw.parse::<u64>() {
        Ok(n) if n.to_string() == raw => Ok(raw),
        _ => Err(SeekerError::type_mismatch(format!(
            "{what} must be a non-negative integer, got '{raw}'"
        ))),
    }
}

fn read_delete_response(class_name: &str, body: JsonValue) -> Result<DeleteSummary> {
    let mut map = match body {
        JsonValue::Object(map) if !map.is_empty() => map,
        JsonValue::Null | JsonValue::Object(_) => {
            tracing::warn!(class = %class_name, "Batch delete returned an empty body");
            return Err(SeekerError::server("Unauthorized"));
        }
        other => {
            return Err(SeekerError::server(format!(
                "unexpected delete response: {other}"
            )))
        }
    };
    if let Some(error) = map.remove("error") {
        return Err(SeekerError::server(error_message(&error)));
    }
    let results = map
        .remove("results")
        .unwrap_or_else(|| JsonValue::Object(Map::new()));
    DeleteSummary::deserialize(results)
        .map_err(|e| SeekerError::server(format!("unexpected delete response: {e}")))
}

fn error_message(error: &JsonValue) -> String {
    let messages: Vec<&str> = match error {
        JsonValue::String(message) => vec![message.as_str()],
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|item| item.get("message").and_then(JsonValue::as_str))
            .collect(),
        JsonValue::Object(_) => error
            .get("message")
            .and_then(JsonValue::as_str)
            .into_iter()
            .collect(),
        _ => Vec::new(),
    };
    if messages.is_empty() {
        error.to_string()
    } else {
        messages.join("; ")
    }
}
