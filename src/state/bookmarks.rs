//! Bookmark store
//!
//! Wraps the [`State`] document and only ever moves a bookmark forward.

use super::types::State;
use crate::error::{Error, Result, ResultExt};
use crate::normalize::{parse_datetime, DisplayZone};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, warn};

/// Monotonic bookmark store seeded with the configured start date
#[derive(Debug, Clone)]
pub struct BookmarkStore {
    state: State,
    start_date: String,
    zone: DisplayZone,
}

impl BookmarkStore {
    /// Create an empty store
    pub fn new(start_date: impl Into<String>, zone: DisplayZone) -> Self {
        Self::with_state(State::new(), start_date, zone)
    }

    /// Create a store holding an existing state
    pub fn with_state(state: State, start_date: impl Into<String>, zone: DisplayZone) -> Self {
        Self {
            state,
            start_date: start_date.into(),
            zone,
        }
    }

    /// Create a store from an inline state JSON document
    pub fn from_json(json: &str, start_date: impl Into<String>, zone: DisplayZone) -> Result<Self> {
        let state: State = serde_json::from_str(json)
            .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))?;
        Ok(Self::with_state(state, start_date, zone))
    }

    /// Create a store from a state file, starting empty if the file is missing
    pub fn from_file(
        path: impl AsRef<Path>,
        start_date: impl Into<String>,
        zone: DisplayZone,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("State file {} not found, starting empty", path.display());
            return Ok(Self::new(start_date, zone));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Self::new(start_date, zone));
        }
        Self::from_json(&contents, start_date, zone)
    }

    /// Current bookmark, or the configured start date when none is stored
    pub fn get(&self, resource: &str, replication_key: &str) -> String {
        self.state
            .get_bookmark(resource, replication_key)
            .unwrap_or(&self.start_date)
            .to_string()
    }

    /// Configured start date as an instant
    pub fn start_parsed(&self) -> Result<DateTime<Utc>> {
        parse_datetime(&self.start_date, self.zone)
    }

    /// Current bookmark and its instant
    ///
    /// A stored value that cannot be parsed is skipped with a warning and the
    /// start date is used instead. Only an unparsable start date is an error.
    pub fn get_parsed(
        &self,
        resource: &str,
        replication_key: &str,
    ) -> Result<(String, DateTime<Utc>)> {
        if let Some(stored) = self.state.get_bookmark(resource, replication_key) {
            match parse_datetime(stored, self.zone) {
                Ok(at) => return Ok((stored.to_string(), at)),
                Err(e) => warn!("{resource}: unusable bookmark, restarting from start date: {e}"),
            }
        }
        Ok((self.start_date.clone(), self.start_parsed()?))
    }

    /// Advance the bookmark if `candidate` is strictly later
    ///
    /// Returns whether the stored value changed.
    pub fn set(&mut self, resource: &str, replication_key: &str, candidate: &str) -> bool {
        let candidate_at = match parse_datetime(candidate, self.zone) {
            Ok(at) => at,
            Err(e) => {
                warn!("{resource}: ignoring unparsable bookmark candidate: {e}");
                return false;
            }
        };

        let current = self.get(resource, replication_key);
        match parse_datetime(&current, self.zone) {
            Ok(current_at) if candidate_at <= current_at => return false,
            Ok(_) => {}
            Err(e) => warn!("{resource}: replacing unparsable bookmark: {e}"),
        }

        debug!("{resource}: bookmark {replication_key} {current} -> {candidate}");
        self.state.set_bookmark(resource, replication_key, candidate);
        true
    }

    /// Record which resource is in progress
    pub fn set_currently_syncing(&mut self, resource: Option<&str>) {
        self.state.currently_syncing = resource.map(ToString::to_string);
    }

    /// Current state document
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Configured start date
    pub fn start_date(&self) -> &str {
        &self.start_date
    }

    /// Zone used to compare naive values
    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    /// Export state as JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }
}
