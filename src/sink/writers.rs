//! Sink implementations

use super::message::Message;
use crate::error::{Error, Result};
use crate::resources::Resource;
use crate::state::State;
use crate::types::JsonValue;
use std::io::Write;

/// Ordered, one-way destination for sync output
pub trait RecordSink {
    /// Deliver one message
    fn emit(&mut self, message: Message) -> Result<()>;

    /// Announce a resource before its records
    fn write_schema(&mut self, resource: &Resource) -> Result<()> {
        self.emit(Message::schema(resource))
    }

    /// Deliver one record
    fn write_record(&mut self, stream: &str, record: JsonValue) -> Result<()> {
        self.emit(Message::record(stream, record))
    }

    /// Deliver a checkpoint
    fn write_state(&mut self, state: &State) -> Result<()> {
        self.emit(Message::state(state.clone()))
    }
}

/// Writes each message as one line of JSON
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl JsonLinesSink<std::io::Stdout> {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of lines written
    pub fn written(&self) -> usize {
        self.written
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, message: Message) -> Result<()> {
        let line = serde_json::to_string(&message)
            .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))?;
        writeln!(self.writer, "{line}")?;
        // State lines must reach the consumer before the next resource starts
        if message.is_state() {
            self.writer.flush()?;
        }
        self.written += 1;
        Ok(())
    }
}

/// Keeps every message in memory
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    messages: Vec<Message>,
}

impl CollectingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in emission order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Records of one stream in emission order
    pub fn records(&self, stream: &str) -> Vec<&JsonValue> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record { stream: s, record } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Every state message's document
    pub fn states(&self) -> Vec<&State> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::State { value } => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Most recent state
    pub fn last_state(&self) -> Option<&State> {
        self.states().pop()
    }

    /// Streams that received a schema, in order
    pub fn schema_streams(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Schema { stream, .. } => Some(stream.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RecordSink for CollectingSink {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.messages.push(message);
        Ok(())
    }
}
