//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use super::strategies::{IdCursorPaginator, SinglePagePaginator, TimestampCursorPaginator};
use crate::error::Result;
use crate::http::Fetch;
use crate::normalize::TimestampNormalizer;
use crate::types::JsonValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Query parameter carrying the lower time bound (epoch milliseconds)
pub const FROM_PARAM: &str = "from";

/// Query parameter and response field carrying the id continuation token
pub const LAST_ID_PARAM: &str = "lastId";

/// Object keys that wrap a page of records
pub const COLLECTION_KEYS: [&str; 2] = ["tasks", "items"];

/// Result of fetching one page
#[derive(Debug, Clone, PartialEq)]
pub enum PageResult {
    /// Normalized records, plus the token the next request will carry
    Page {
        /// Records of this page in upstream order
        records: Vec<JsonValue>,
        /// Continuation token, `None` when this was the last page
        cursor: Option<String>,
    },
    /// No more pages
    Done,
    /// The response was not a collection (normalized, returned whole)
    Malformed(JsonValue),
}

impl PageResult {
    /// Create a page result
    pub fn page(records: Vec<JsonValue>, cursor: Option<String>) -> Self {
        Self::Page { records, cursor }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Number of records carried
    pub fn len(&self) -> usize {
        match self {
            Self::Page { records, .. } => records.len(),
            Self::Done => 0,
            Self::Malformed(_) => 1,
        }
    }

    /// True when no record is carried
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pagination variant of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    /// One request, the whole response is the result set
    #[default]
    SinglePage,
    /// `lastId` is the id of the last record of the previous page
    IdCursor,
    /// Fixed `from` plus the `lastId` token returned by the API
    TimestampCursor,
}

impl Pagination {
    /// Build a paginator for one sync run
    pub fn paginator(
        self,
        path: impl Into<String>,
        from: Option<i64>,
        replication_key: Option<&str>,
        normalizer: TimestampNormalizer,
    ) -> Box<dyn Paginator> {
        let path = path.into();
        match self {
            Self::SinglePage => Box::new(SinglePagePaginator::new(path, from, normalizer)),
            Self::IdCursor => Box::new(IdCursorPaginator::new(path, from, normalizer)),
            Self::TimestampCursor => Box::new(TimestampCursorPaginator::new(
                path,
                from,
                replication_key.unwrap_or("timeLastModified"),
                normalizer,
            )),
        }
    }
}

/// Core trait for pagination strategies
#[async_trait]
pub trait Paginator: Send {
    /// Fetch the next page, or report that pagination is over
    async fn fetch_page(&mut self, fetcher: &dyn Fetch) -> Result<PageResult>;
}

/// Shape of a decoded response body
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ResponseShape {
    /// Bare array or `{tasks|items: [...], lastId?}`
    Collection {
        items: Vec<JsonValue>,
        last_id: Option<String>,
    },
    /// Anything else, e.g. a single aggregate object
    Single(JsonValue),
}

/// Classify a response body
pub(crate) fn classify(body: JsonValue) -> ResponseShape {
    match body {
        JsonValue::Array(items) => ResponseShape::Collection {
            items,
            last_id: None,
        },
        JsonValue::Object(mut map) => {
            let key = COLLECTION_KEYS
                .iter()
                .find(|key| map.get(**key).is_some_and(JsonValue::is_array));
            match key {
                Some(key) => {
                    let items = match map.remove(*key) {
                        Some(JsonValue::Array(items)) => items,
                        _ => Vec::new(),
                    };
                    let last_id = map.get(LAST_ID_PARAM).and_then(token_string);
                    ResponseShape::Collection { items, last_id }
                }
                None => ResponseShape::Single(JsonValue::Object(map)),
            }
        }
        other => ResponseShape::Single(other),
    }
}

/// Render an id-like value as a query token
pub(crate) fn token_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
