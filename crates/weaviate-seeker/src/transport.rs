//! Backend transport seam.
//!
//! [`QuerySpec`](crate::QuerySpec) never talks to the network itself. It
//! lowers its state into one of the request types below and hands it to a
//! [`Transport`]. [`MockTransport`] records those requests for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Result, SeekerError};

/// Field list of an aggregate request.
pub const COUNT_FIELDS: &str = "meta { count }";

/// Parameter bag of a fetch.
///
/// Optional keys are present only when the matching directive produced
/// output, and are skipped when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledQuery {
    pub class_name: String,
    pub limit: String,
    pub offset: String,
    pub fields: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_vector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bm25: Option<String>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
}

/// Parameter bag of a count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateQuery {
    pub class_name: String,
    pub fields: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_vector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_object: Option<String>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Batch delete request. `filter` is the generic nested form of the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDelete {
    pub class_name: String,
    #[serde(rename = "where")]
    pub filter: JsonValue,
}

/// Outcome of a batch delete as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteSummary {
    #[serde(default)]
    pub matches: u64,
    #[serde(default)]
    pub successful: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub limit: u64,
}

/// Executes lowered requests against a backend.
///
/// Implementations report unreachable backends as
/// [`SeekerError::Connection`] and backend-side failures as
/// [`SeekerError::Server`]. No retries happen above this trait.
pub trait Transport {
    /// Fetches raw records, each possibly carrying an `_additional` block.
    fn get(&self, query: &CompiledQuery) -> Result<Vec<Map<String, JsonValue>>>;

    /// Returns the number of matching records.
    fn aggregate(&self, query: &AggregateQuery) -> Result<u64>;

    /// Deletes matching records and returns the raw response body.
    fn batch_delete(&self, request: &BatchDelete) -> Result<JsonValue>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, query: &CompiledQuery) -> Result<Vec<Map<String, JsonValue>>> {
        (**self).get(query)
    }

    fn aggregate(&self, query: &AggregateQuery) -> Result<u64> {
        (**self).aggregate(query)
    }

    fn batch_delete(&self, request: &BatchDelete) -> Result<JsonValue> {
        (**self).batch_delete(request)
    }
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn get(&self, query: &CompiledQuery) -> Result<Vec<Map<String, JsonValue>>> {
        (**self).get(query)
    }

    fn aggregate(&self, query: &AggregateQuery) -> Result<u64> {
        (**self).aggregate(query)
    }

    fn batch_delete(&self, request: &BatchDelete) -> Result<JsonValue> {
        (**self).batch_delete(request)
    }
}

// === Mock implementation for testing ===

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Get(CompiledQuery),
    Aggregate(AggregateQuery),
    BatchDelete(BatchDelete),
}

/// Recording transport for tests.
///
/// Responses are queued per call kind and consumed in order. With nothing
/// queued a fetch returns no records, a count returns zero and a delete
/// returns `null`. A queued failure is returned by the next call of any
/// kind, ahead of its response.
#[derive(Debug, Default)]
pub struct MockTransport {
    records: RefCell<VecDeque<Vec<Map<String, JsonValue>>>>,
    counts: RefCell<VecDeque<u64>>,
    deletes: RefCell<VecDeque<JsonValue>>,
    failures: RefCell<VecDeque<SeekerError>>,
    requests: RefCell<Vec<Request>>,
}

impl MockTransport {
    /// Create a mock with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fetch response. Non-object items of the array are dropped.
    pub fn with_records(self, records: JsonValue) -> Self {
        self.push_records(records);
        self
    }

    /// Queue a count response.
    pub fn with_count(self, count: u64) -> Self {
        self.counts.borrow_mut().push_back(count);
        self
    }

    /// Queue a batch delete response body.
    pub fn with_delete_response(self, body: JsonValue) -> Self {
        self.deletes.borrow_mut().push_back(body);
        self
    }

    /// Queue a failure for the next call.
    pub fn with_failure(self, error: SeekerError) -> Self {
        self.failures.borrow_mut().push_back(error);
        self
    }

    /// Queue a fetch response on a shared mock.
    pub fn push_records(&self, records: JsonValue) {
        let batch = match records {
            JsonValue::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    JsonValue::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        self.records.borrow_mut().push_back(batch);
    }

    /// Returns every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    /// Number of fetches issued.
    pub fn get_calls(&self) -> usize {
        self.count_requests(|r| matches!(r, Request::Get(_)))
    }

    /// Number of counts issued.
    pub fn aggregate_calls(&self) -> usize {
        self.count_requests(|r| matches!(r, Request::Aggregate(_)))
    }

    /// Number of batch deletes issued.
    pub fn delete_calls(&self) -> usize {
        self.count_requests(|r| matches!(r, Request::BatchDelete(_)))
    }

    /// Returns the most recent fetch request.
    pub fn last_get(&self) -> Option<CompiledQuery> {
        self.requests.borrow().iter().rev().find_map(|r| match r {
            Request::Get(query) => Some(query.clone()),
            _ => None,
        })
    }

    fn count_requests(&self, pred: impl Fn(&Request) -> bool) -> usize {
        self.requests.borrow().iter().filter(|r| pred(r)).count()
    }

    fn record(&self, request: Request) -> Result<()> {
        self.requests.borrow_mut().push(request);
        match self.failures.borrow_mut().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Transport for MockTransport {
    fn get(&self, query: &CompiledQuery) -> Result<Vec<Map<String, JsonValue>>> {
        self.record(Request::Get(query.clone()))?;
        Ok(self.records.borrow_mut().pop_front().unwrap_or_default())
    }

    fn aggregate(&self, query: &AggregateQuery) -> Result<u64> {
        self.record(Request::Aggregate(query.clone()))?;
        Ok(self.counts.borrow_mut().pop_front().unwrap_or(0))
    }

    fn batch_delete(&self, request: &BatchDelete) -> Result<JsonValue> {
        self.record(Request::BatchDelete(request.clone()))?;
        Ok(self.deletes.borrow_mut().pop_front().unwrap_or(JsonValue::Null))
    }
}
