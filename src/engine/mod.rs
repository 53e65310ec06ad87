//! Execution engine module
//!
//! Drives each selected resource through its paginator and keeps the
//! bookmarks moving forward.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Per-resource sync and the driver over all resources
//! - `SyncConfig` - Configuration for sync operations
//! - `SyncStats` - Run statistics
//!
//! A FULL_TABLE resource is fetched from the configured start date and never
//! reads or writes a bookmark. An INCREMENTAL resource is fetched from its
//! bookmark and advances it after every emitted record.

mod types;

pub use types::{SyncConfig, SyncStats};

use crate::error::{Error, Result};
use crate::http::Fetch;
use crate::normalize::TimestampNormalizer;
use crate::pagination::PageResult;
use crate::resources::Resource;
use crate::sink::RecordSink;
use crate::state::BookmarkStore;
use crate::types::JsonValue;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine<F: Fetch> {
    /// Source of response bodies
    fetcher: F,
    /// Bookmarks of incremental resources
    bookmarks: BookmarkStore,
    /// Timestamp rendering
    normalizer: TimestampNormalizer,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl<F: Fetch> SyncEngine<F> {
    /// Create a new sync engine
    pub fn new(fetcher: F, bookmarks: BookmarkStore) -> Self {
        let normalizer = TimestampNormalizer::new(bookmarks.zone());
        Self {
            fetcher,
            bookmarks,
            normalizer,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the bookmark store
    pub fn bookmarks(&self) -> &BookmarkStore {
        &self.bookmarks
    }

    /// Consume the engine, keeping the bookmarks
    pub fn into_bookmarks(self) -> BookmarkStore {
        self.bookmarks
    }

    /// Get the fetcher
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync every resource in order, writing state after each one
    ///
    /// A failed resource is logged and skipped unless `fail_fast` is set; the
    /// run then ends with [`Error::SyncFailed`] once all resources were tried.
    pub async fn sync(
        &mut self,
        resources: &[&Resource],
        sink: &mut dyn RecordSink,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        let mut failed = 0;

        for resource in resources {
            self.bookmarks.set_currently_syncing(Some(resource.name));
            let outcome = self.sync_resource(resource, sink).await;
            self.bookmarks.set_currently_syncing(None);

            match outcome {
                Ok(count) => {
                    self.stats.add_resource();
                    info!("{}: Completed sync ({count} rows)", resource.name);
                }
                Err(e) => {
                    failed += 1;
                    self.stats.add_failure();
                    error!("{}: Sync failed: {e}", resource.name);
                    if self.config.fail_fast {
                        sink.write_state(self.bookmarks.state())?;
                        self.finish(start);
                        return Err(e);
                    }
                }
            }

            sink.write_state(self.bookmarks.state())?;
        }

        sink.write_state(self.bookmarks.state())?;
        self.finish(start);
        info!(
            "Finished sync: {} records in {} pages, {} resources ok, {failed} failed, {} quota pauses",
            self.stats.records_synced,
            self.stats.pages_fetched,
            self.stats.resources_synced,
            self.stats.throttle_pauses
        );

        if failed > 0 {
            return Err(Error::SyncFailed {
                failed,
                total: resources.len(),
            });
        }
        Ok(self.stats.clone())
    }

    /// Sync a single resource, returning the number of records emitted
    pub async fn sync_resource(
        &mut self,
        resource: &Resource,
        sink: &mut dyn RecordSink,
    ) -> Result<usize> {
        let replication_key = resource.replication_key.filter(|_| resource.is_incremental());
        let (start_value, start_at) = match replication_key {
            Some(key) => self.bookmarks.get_parsed(resource.name, key)?,
            None => (
                self.bookmarks.start_date().to_string(),
                self.bookmarks.start_parsed()?,
            ),
        };
        let from = start_at.timestamp_millis();

        info!(
            "{}: Starting {} sync from {start_value}",
            resource.name, resource.replication_method
        );
        sink.write_schema(resource)?;

        let mut paginator = resource.pagination.paginator(
            resource.path,
            Some(from),
            resource.replication_key,
            self.normalizer,
        );
        let mut count = 0;

        loop {
            let page = paginator.fetch_page(&self.fetcher).await?;
            match page {
                PageResult::Done => break,
                PageResult::Malformed(raw) => {
                    warn!(
                        "{}: response is not a collection, emitting it as one record without a bookmark update",
                        resource.name
                    );
                    self.stats.add_page();
                    sink.write_record(resource.name, raw)?;
                    self.stats.add_records(resource.name, 1);
                    count += 1;
                }
                PageResult::Page { records, cursor } => {
                    self.stats.add_page();
                    let page_len = records.len();

                    for record in records {
                        let candidate = replication_key
                            .map(|key| (key, Self::replication_value(&record, key)));
                        sink.write_record(resource.name, record)?;
                        count += 1;

                        if let Some((key, value)) = candidate {
                            self.advance_bookmark(resource.name, key, value);
                        }
                    }
                    self.stats.add_records(resource.name, page_len);

                    debug!("{}: page {page_len} records, cursor {cursor:?}", resource.name);
                    if self.config.emit_state_per_page && replication_key.is_some() {
                        sink.write_state(self.bookmarks.state())?;
                    }
                }
            }
        }

        Ok(count)
    }

    fn replication_value(record: &JsonValue, key: &str) -> Option<String> {
        record.get(key).and_then(JsonValue::as_str).map(ToString::to_string)
    }

    fn advance_bookmark(&mut self, resource: &str, key: &str, value: Option<String>) {
        match value {
            Some(value) => {
                self.bookmarks.set(resource, key, &value);
            }
            None => warn!("{resource}: record without {key}, bookmark not advanced"),
        }
    }

    fn finish(&mut self, start: Instant) {
        self.stats.throttle_pauses = self.fetcher.throttle_pauses();
        #[allow(clippy::cast_possible_truncation)]
        self.stats.set_duration(start.elapsed().as_millis() as u64);
    }
}
