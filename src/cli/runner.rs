//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::TapConfig;
use crate::engine::{SyncConfig, SyncEngine, SyncStats};
use crate::error::{Error, Result};
use crate::http::{Fetch, HttpClient};
use crate::resources::{self, Catalog, Resource};
use crate::sink::JsonLinesSink;
use crate::state::BookmarkStore;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use tracing::{error, info};

/// Endpoint answering 200 for a valid API key
pub const CHECK_PATH: &str = "auth/test";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing to stdout
    pub async fn run(&self) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_to(&mut out).await
    }

    /// Run the CLI command, writing to `out`
    pub async fn run_to(&self, out: &mut dyn Write) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Check => self.check(&config, out).await,
            Commands::Discover => self.discover(out),
            Commands::Read {
                streams,
                catalog,
                state_per_page,
                fail_fast,
            } => {
                let selected = self.select_streams(streams, catalog.as_deref())?;
                let sync_config = SyncConfig::new()
                    .with_state_per_page(*state_per_page)
                    .with_fail_fast(*fail_fast);
                self.read(&config, &selected, sync_config, out)
                    .await
                    .map(|_| ())
            }
        }
    }

    /// Load and validate the tap configuration
    fn load_config(&self) -> Result<TapConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use --config)"))?;
        TapConfig::from_file(path)
    }

    /// Build the bookmark store from `--state` or `--state-json`
    fn load_bookmarks(&self, config: &TapConfig) -> Result<BookmarkStore> {
        let zone = config.zone()?;
        if let Some(json) = &self.cli.state_json {
            return BookmarkStore::from_json(json, &config.start_date, zone);
        }
        match &self.cli.state {
            Some(path) => BookmarkStore::from_file(path, &config.start_date, zone),
            None => Ok(BookmarkStore::new(&config.start_date, zone)),
        }
    }

    /// Resolve `--streams`, then catalog selection, then everything
    pub(crate) fn select_streams(
        &self,
        streams: &[String],
        catalog: Option<&Path>,
    ) -> Result<Vec<&'static Resource>> {
        let names: Vec<String> = streams
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if !names.is_empty() {
            return resources::select(&names);
        }

        if let Some(path) = catalog {
            let selected = Catalog::from_file(path)?.selected_streams();
            if selected.is_empty() {
                info!("No stream selected in {}, syncing all", path.display());
            }
            return resources::select(&selected);
        }

        resources::select::<String>(&[])
    }

    fn client(config: &TapConfig) -> Result<HttpClient> {
        HttpClient::with_credentials(config.http_config(), config.credentials())
    }

    /// Check the API key
    async fn check(&self, config: &TapConfig, out: &mut dyn Write) -> Result<()> {
        let client = Self::client(config)?;

        match client.fetch(CHECK_PATH, &Vec::new()).await {
            Ok(_) => {
                info!("Connection check succeeded");
                write_message(
                    out,
                    &json!({
                        "type": "CONNECTION_STATUS",
                        "connectionStatus": {"status": "SUCCEEDED"}
                    }),
                )
            }
            Err(e) => {
                error!("Connection check failed: {e}");
                write_message(
                    out,
                    &json!({
                        "type": "CONNECTION_STATUS",
                        "connectionStatus": {
                            "status": "FAILED",
                            "message": format!("Connection failed: {e}")
                        }
                    }),
                )?;
                Err(e)
            }
        }
    }

    /// Print the catalog
    fn discover(&self, out: &mut dyn Write) -> Result<()> {
        info!("Starting discover");
        let catalog = Catalog::discover();
        let rendered = serde_json::to_string_pretty(&catalog)
            .map_err(|e| Error::output(format!("Failed to serialize catalog: {e}")))?;
        writeln!(out, "{rendered}")?;
        info!("Finished discover ({} streams)", catalog.streams.len());
        Ok(())
    }

    /// Sync the selected resources
    async fn read(
        &self,
        config: &TapConfig,
        selected: &[&'static Resource],
        sync_config: SyncConfig,
        out: &mut dyn Write,
    ) -> Result<SyncStats> {
        let bookmarks = self.load_bookmarks(config)?;
        let client = Self::client(config)?;
        let mut engine = SyncEngine::new(client, bookmarks).with_config(sync_config);
        let mut sink = JsonLinesSink::new(out);

        info!(
            "Syncing {} streams: {}",
            selected.len(),
            selected
                .iter()
                .map(|r| r.name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        let result = engine.sync(selected, &mut sink).await;
        info!(
            "{} requests made in {}ms",
            engine.fetcher().request_count(),
            engine.stats().duration_ms
        );
        result
    }
}

fn write_message(out: &mut dyn Write, message: &serde_json::Value) -> Result<()> {
    writeln!(out, "{message}")?;
    Ok(())
}
