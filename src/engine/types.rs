//! Engine types
//!
//! Configuration and run statistics for the sync engine.

use std::collections::BTreeMap;

/// Configuration for sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Whether to emit state after each page of an incremental resource
    pub emit_state_per_page: bool,
    /// Whether the first failed resource aborts the run
    pub fail_fast: bool,
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit state after each page
    #[must_use]
    pub fn with_state_per_page(mut self, emit: bool) -> Self {
        self.emit_state_per_page = emit;
        self
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records synced
    pub records_synced: usize,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Resources that completed
    pub resources_synced: usize,
    /// Resources that failed
    pub failures: usize,
    /// Quota pauses taken by the fetcher
    pub throttle_pauses: u64,
    /// Records per resource
    pub records_by_resource: BTreeMap<String, usize>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records for a resource
    pub fn add_records(&mut self, resource: &str, count: usize) {
        self.records_synced += count;
        *self
            .records_by_resource
            .entry(resource.to_string())
            .or_default() += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a completed resource
    pub fn add_resource(&mut self) {
        self.resources_synced += 1;
    }

    /// Add a failed resource
    pub fn add_failure(&mut self) {
        self.failures += 1;
    }

    /// Records synced for one resource
    pub fn records_for(&self, resource: &str) -> usize {
        self.records_by_resource.get(resource).copied().unwrap_or(0)
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
