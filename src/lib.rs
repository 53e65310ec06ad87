// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-onfleet
//!
//! A Singer tap that replicates Onfleet administrators, hubs, organizations,
//! tasks, teams and workers as JSON lines with incremental bookmarks.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_onfleet::{resources, BookmarkStore, HttpClient, JsonLinesSink, SyncEngine, TapConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> tap_onfleet::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let client = HttpClient::with_credentials(config.http_config(), config.credentials())?;
//!     let bookmarks = BookmarkStore::new(&config.start_date, config.zone()?);
//!
//!     let mut engine = SyncEngine::new(client, bookmarks);
//!     let mut sink = JsonLinesSink::stdout();
//!     engine.sync(&resources::select(&["tasks"])?, &mut sink).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  cli: check / discover / read      config: TapConfig          │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │  engine: SyncEngine  ──►  sink: RecordSink (Singer messages)  │
//! └──────┬──────────────┬──────────────┬─────────────────────────┘
//!        │              │              │
//! ┌──────┴─────┐ ┌──────┴──────┐ ┌─────┴───────┐ ┌──────────────┐
//! │ pagination │ │    http     │ │   state     │ │  normalize   │
//! │ SinglePage │ │ Retry       │ │ Bookmarks   │ │ epoch → text │
//! │ IdCursor   │ │ Quota pause │ │ (monotonic) │ │              │
//! │ Timestamp  │ │ Rate limit  │ │             │ │              │
//! └────────────┘ └─────────────┘ └─────────────┘ └──────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Epoch timestamp normalization
pub mod normalize;

/// HTTP client with retry, quota throttling and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Bookmark state
pub mod state;

/// Resource registry and catalog
pub mod resources;

/// Record sinks
pub mod sink;

/// Main execution engine
pub mod engine;

/// Tap configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::TapConfig;
pub use engine::{SyncConfig, SyncEngine, SyncStats};
pub use http::{Fetch, HttpClient};
pub use normalize::{DisplayZone, TimestampNormalizer};
pub use resources::{Catalog, Resource};
pub use sink::{CollectingSink, JsonLinesSink, RecordSink};
pub use state::{BookmarkStore, State};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
