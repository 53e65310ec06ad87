//! Sink message types

use crate::resources::Resource;
use crate::state::State;
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Stream description, sent once before its records
    Schema {
        /// Stream name
        stream: String,
        /// JSON schema of a record
        schema: JsonValue,
        /// Primary key fields
        key_properties: Vec<String>,
        /// Replication key, if any
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One normalized record
    Record {
        /// Stream name
        stream: String,
        /// Record body
        record: JsonValue,
    },
    /// Checkpoint
    State {
        /// Complete state document
        value: State,
    },
}

impl Message {
    /// Create a schema message for a resource
    pub fn schema(resource: &Resource) -> Self {
        Self::Schema {
            stream: resource.name.to_string(),
            schema: resource.schema(),
            key_properties: resource
                .key_properties
                .iter()
                .map(ToString::to_string)
                .collect(),
            bookmark_properties: resource
                .replication_key
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Create a record message
    pub fn record(stream: impl Into<String>, record: JsonValue) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
        }
    }

    /// Create a state message
    pub fn state(value: State) -> Self {
        Self::State { value }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }
}
