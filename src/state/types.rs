//! State types for tracking sync progress
//!
//! Serialized the Singer way so the document can be handed back on the next
//! run unchanged:
//!
//! ```json
//! {"bookmarks": {"workers": {"timeLastModified": "2023-01-01 02:00:00"}}}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Replication-key values of one resource
pub type ResourceBookmark = BTreeMap<String, String>;

/// Complete state of the tap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Per-resource bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, ResourceBookmark>,

    /// Resource being synced when the state was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currently_syncing: Option<String>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a bookmark value
    pub fn get_bookmark(&self, resource: &str, key: &str) -> Option<&str> {
        self.bookmarks.get(resource)?.get(key).map(String::as_str)
    }

    /// Set a bookmark value unconditionally
    pub fn set_bookmark(&mut self, resource: &str, key: &str, value: impl Into<String>) {
        self.bookmarks
            .entry(resource.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Check whether a resource has any bookmark
    pub fn has_bookmark(&self, resource: &str) -> bool {
        self.bookmarks.get(resource).is_some_and(|b| !b.is_empty())
    }
}
