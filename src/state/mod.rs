//! State management module
//!
//! Holds the per-resource bookmarks that make incremental syncs resumable.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Singer state document with per-resource bookmarks
//! - `BookmarkStore` - monotonic bookmark access with a start-date default

mod bookmarks;
mod types;

pub use bookmarks::BookmarkStore;
pub use types::{ResourceBookmark, State};
