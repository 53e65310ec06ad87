//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `check` - Test the API key
//! - `discover` - Print the catalog
//! - `read` - Sync streams as Singer messages

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{Runner, CHECK_PATH};

#[cfg(test)]
mod tests;
