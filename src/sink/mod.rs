//! Record sink module
//!
//! Where synced data goes. The engine hands every resource's schema, records
//! and state to a [`RecordSink`] in order.
//!
//! # Overview
//!
//! - `Message` - Singer SCHEMA / RECORD / STATE message
//! - `JsonLinesSink` - one JSON message per line on any writer (stdout by default)
//! - `CollectingSink` - keeps messages in memory

mod message;
mod writers;

pub use message::Message;
pub use writers::{CollectingSink, JsonLinesSink, RecordSink};
