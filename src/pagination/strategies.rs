//! Pagination strategy implementations
//!
//! Each strategy handles one of the patterns the Onfleet endpoints use.

use super::types::{
    classify, token_string, PageResult, Paginator, ResponseShape, FROM_PARAM, LAST_ID_PARAM,
};
use crate::error::Result;
use crate::http::Fetch;
use crate::normalize::TimestampNormalizer;
use crate::types::{JsonValue, QueryParams};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Base query carrying the `from` bound when there is one
fn base_query(from: Option<i64>) -> QueryParams {
    from.map(|ms| vec![(FROM_PARAM.to_string(), ms.to_string())])
        .unwrap_or_default()
}

// ============================================================================
// Single Page
// ============================================================================

/// One request, no continuation
///
/// Used by small resources (`admins`, `hubs`, `teams`, `organization`).
#[derive(Debug, Clone)]
pub struct SinglePagePaginator {
    path: String,
    from: Option<i64>,
    normalizer: TimestampNormalizer,
    done: bool,
}

impl SinglePagePaginator {
    /// Create a new single page paginator
    pub fn new(path: impl Into<String>, from: Option<i64>, normalizer: TimestampNormalizer) -> Self {
        Self {
            path: path.into(),
            from,
            normalizer,
            done: false,
        }
    }
}

#[async_trait]
impl Paginator for SinglePagePaginator {
    async fn fetch_page(&mut self, fetcher: &dyn Fetch) -> Result<PageResult> {
        if self.done {
            return Ok(PageResult::Done);
        }
        self.done = true;

        let body = fetcher.fetch(&self.path, &base_query(self.from)).await?;
        Ok(match classify(body) {
            ResponseShape::Collection { items, .. } => {
                PageResult::page(self.normalizer.normalize_all(items), None)
            }
            ResponseShape::Single(raw) => PageResult::Malformed(self.normalizer.normalize(raw)),
        })
    }
}

// ============================================================================
// Id Cursor
// ============================================================================

/// Id cursor pagination
///
/// The id of the last record of a page is sent as `lastId` for the next one.
/// An empty page ends the run.
#[derive(Debug, Clone)]
pub struct IdCursorPaginator {
    path: String,
    from: Option<i64>,
    normalizer: TimestampNormalizer,
    last_id: Option<String>,
    done: bool,
}

impl IdCursorPaginator {
    /// Create a new id cursor paginator
    pub fn new(path: impl Into<String>, from: Option<i64>, normalizer: TimestampNormalizer) -> Self {
        Self {
            path: path.into(),
            from,
            normalizer,
            last_id: None,
            done: false,
        }
    }

    /// Token sent with the next request
    pub fn last_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }
}

#[async_trait]
impl Paginator for IdCursorPaginator {
    async fn fetch_page(&mut self, fetcher: &dyn Fetch) -> Result<PageResult> {
        if self.done {
            return Ok(PageResult::Done);
        }

        let mut query = base_query(self.from);
        if let Some(last_id) = &self.last_id {
            query.push((LAST_ID_PARAM.to_string(), last_id.clone()));
        }

        let body = fetcher.fetch(&self.path, &query).await?;
        let items = match classify(body) {
            ResponseShape::Collection { items, .. } => items,
            ResponseShape::Single(raw) => {
                self.done = true;
                return Ok(PageResult::Malformed(self.normalizer.normalize(raw)));
            }
        };

        if items.is_empty() {
            debug!("{}: empty page, pagination complete", self.path);
            self.done = true;
            return Ok(PageResult::Done);
        }

        let next = items.last().and_then(|last| last.get("id")).and_then(token_string);
        match next {
            Some(id) if self.last_id.as_deref() == Some(id.as_str()) => {
                warn!("{}: cursor '{id}' repeated, stopping pagination", self.path);
                self.done = true;
                Ok(PageResult::Done)
            }
            Some(id) => {
                self.last_id = Some(id.clone());
                Ok(PageResult::page(self.normalizer.normalize_all(items), Some(id)))
            }
            None => {
                warn!("{}: last record has no id, stopping after this page", self.path);
                self.done = true;
                Ok(PageResult::page(self.normalizer.normalize_all(items), None))
            }
        }
    }
}

// ============================================================================
// Timestamp Cursor
// ============================================================================

/// Timestamp cursor with id tiebreak (e.g. `tasks/all`)
///
/// Every request carries the same `from`; the API's `lastId` selects the next
/// slice inside that window. A response without `lastId` is the last page.
/// The content-time position advances with each record handed out.
#[derive(Debug, Clone)]
pub struct TimestampCursorPaginator {
    path: String,
    from: Option<i64>,
    replication_key: String,
    normalizer: TimestampNormalizer,
    last_id: Option<String>,
    position: Option<String>,
    done: bool,
}

impl TimestampCursorPaginator {
    /// Create a new timestamp cursor paginator
    pub fn new(
        path: impl Into<String>,
        from: Option<i64>,
        replication_key: impl Into<String>,
        normalizer: TimestampNormalizer,
    ) -> Self {
        Self {
            path: path.into(),
            from,
            replication_key: replication_key.into(),
            normalizer,
            last_id: None,
            position: None,
            done: false,
        }
    }

    /// Token sent with the next request
    pub fn last_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    /// Replication-key value of the latest record handed out
    pub fn position(&self) -> Option<&str> {
        self.position.as_deref()
    }
}

#[async_trait]
impl Paginator for TimestampCursorPaginator {
    async fn fetch_page(&mut self, fetcher: &dyn Fetch) -> Result<PageResult> {
        if self.done {
            return Ok(PageResult::Done);
        }

        let mut query = base_query(self.from);
        if let Some(last_id) = &self.last_id {
            query.push((LAST_ID_PARAM.to_string(), last_id.clone()));
        }

        let body = fetcher.fetch(&self.path, &query).await?;
        let (items, next) = match classify(body) {
            ResponseShape::Collection { items, last_id } => (items, last_id),
            ResponseShape::Single(raw) => {
                self.done = true;
                return Ok(PageResult::Malformed(self.normalizer.normalize(raw)));
            }
        };

        let records = self.normalizer.normalize_all(items);
        if let Some(latest) = records
            .iter()
            .rev()
            .find_map(|record| record.get(&self.replication_key).and_then(JsonValue::as_str))
        {
            self.position = Some(latest.to_string());
        }

        let cursor = match next {
            None => {
                debug!("{}: no {LAST_ID_PARAM} in response, pagination complete", self.path);
                self.done = true;
                None
            }
            Some(id) if self.last_id.as_deref() == Some(id.as_str()) => {
                warn!("{}: cursor '{id}' repeated, stopping pagination", self.path);
                self.done = true;
                None
            }
            Some(id) => {
                self.last_id = Some(id.clone());
                Some(id)
            }
        };

        Ok(PageResult::page(records, cursor))
    }
}
