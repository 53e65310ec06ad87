//! Pagination module
//!
//! Supports: Single Page, Id Cursor, Timestamp Cursor
//!
//! # Overview
//!
//! Each Onfleet list endpoint pages one of three ways. A strategy issues the
//! requests for one resource, normalizes the timestamps of every record and
//! tells the caller when the run is over. Responses that are not a collection
//! are surfaced as [`PageResult::Malformed`] instead of failing the sync.

mod strategies;
mod types;

pub use strategies::{IdCursorPaginator, SinglePagePaginator, TimestampCursorPaginator};
pub use types::{PageResult, Pagination, Paginator, COLLECTION_KEYS, FROM_PARAM, LAST_ID_PARAM};

#[cfg(test)]
pub(crate) mod testing;
