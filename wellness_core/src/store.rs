//! Document store interface.
//!
//! Records live in named collections of JSON objects keyed by an id the
//! store assigns. Repositories talk to the store only through
//! [`DocumentStore`]; [`crate::local_store::LocalStore`] is the bundled
//! implementation.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// JSON object holding a document's fields
pub type Fields = Map<String, Value>;

/// Receives the full matching result set of a live query
pub type SnapshotCallback = Box<dyn FnMut(&[Document])>;

/// Receives failures affecting a live query
pub type ErrorCallback = Box<dyn FnMut(&Error)>;

/// Handle returned by [`DocumentStore::subscribe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// A stored record and its key
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Deserialize the fields into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            Error::Store(format!("document '{}' is malformed: {}", self.id, e))
        })
    }
}

/// Serialize a record into document fields
pub fn encode<T: Serialize>(record: &T) -> Result<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(Error::Store(format!(
            "records must serialize to a JSON object, got {}",
            other
        ))),
    }
}

// ============================================================================
// Queries
// ============================================================================

/// A condition on one top-level field
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
}

impl Filter {
    /// Missing fields and mismatched types never match
    pub fn matches(&self, fields: &Fields) -> bool {
        let (field, wanted) = match self {
            Filter::Eq(f, v) | Filter::Gt(f, v) | Filter::Gte(f, v) | Filter::Lt(f, v)
            | Filter::Lte(f, v) => (f, v),
        };
        let Some(actual) = fields.get(field) else {
            return false;
        };

        if let Filter::Eq(..) = self {
            if actual == wanted {
                return true;
            }
        }

        match (self, compare_values(actual, wanted)) {
            (Filter::Eq(..), Some(ord)) => ord == Ordering::Equal,
            (Filter::Gt(..), Some(ord)) => ord == Ordering::Greater,
            (Filter::Gte(..), Some(ord)) => ord != Ordering::Less,
            (Filter::Lt(..), Some(ord)) => ord == Ordering::Less,
            (Filter::Lte(..), Some(ord)) => ord != Ordering::Greater,
            (_, None) => false,
        }
    }
}

/// Order of query results
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Filters, ordering and limit over a single collection
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    /// Every document in a collection
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.into(), value.into()));
        self
    }

    pub fn where_gt(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gt(field.into(), value.into()));
        self
    }

    pub fn where_gte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(field.into(), value.into()));
        self
    }

    pub fn where_lt(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lt(field.into(), value.into()));
        self
    }

    pub fn where_lte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lte(field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters.iter().all(|f| f.matches(fields))
    }

    /// Filter, sort and truncate a set of documents
    ///
    /// Sorting is stable, so documents comparing equal (or lacking the
    /// order field) keep their input order.
    pub fn apply<I>(&self, documents: I) -> Vec<Document>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut results: Vec<Document> = documents
            .into_iter()
            .filter(|doc| self.matches(&doc.fields))
            .collect();

        if let Some(order) = &self.order_by {
            results.sort_by(|a, b| {
                let ord = match (a.fields.get(&order.field), b.fields.get(&order.field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }
        results
    }
}

/// Numbers compare numerically, strings lexically, booleans by value
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

// ============================================================================
// Store trait
// ============================================================================

/// Keyed collections of JSON records with queries and live subscriptions.
///
/// Every operation returns a success payload or an [`Error`] describing
/// the failure; nothing is retried.
pub trait DocumentStore {
    /// Insert a record under a newly assigned key
    fn create(&mut self, collection: &str, fields: Fields) -> Result<String>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    fn query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Shallow-merge `fields` into an existing record
    fn update(&mut self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    fn delete(&mut self, collection: &str, id: &str) -> Result<()>;

    /// Deliver the matching set now and again after every change to the
    /// query's collection, until unsubscribed
    fn subscribe(
        &mut self,
        query: Query,
        on_snapshot: SnapshotCallback,
        on_error: ErrorCallback,
    ) -> Result<SubscriptionId>;

    /// Returns false if the subscription was already cancelled
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}
