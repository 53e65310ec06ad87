//! tap-onfleet CLI
//!
//! Singer messages go to stdout, logs to stderr.

use clap::Parser;
use tap_onfleet::cli::{Cli, Runner};
use tracing::error;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    let runner = Runner::new(cli);
    if let Err(e) = runtime.block_on(runner.run()) {
        error!("{e}");
        std::process::exit(1);
    }
}
