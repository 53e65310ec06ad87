//! Catalog types
//!
//! Singer discovery output. Metadata is a list of breadcrumb entries, the
//! empty breadcrumb describing the stream itself and `["properties", field]`
//! describing one field.

use super::registry::{all, Resource};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

/// Field is always emitted
pub const INCLUSION_AUTOMATIC: &str = "automatic";

/// Field may be deselected
pub const INCLUSION_AVAILABLE: &str = "available";

/// Discovered catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    pub streams: Vec<CatalogEntry>,
}

/// Stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,

    /// Stream name
    pub stream: String,

    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// JSON schema of a record
    #[serde(default)]
    pub schema: JsonValue,

    /// Breadcrumb metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

/// One breadcrumb of stream metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Empty for the stream, `["properties", field]` for a field
    pub breadcrumb: Vec<String>,
    /// Metadata values
    pub metadata: JsonObject,
}

impl MetadataEntry {
    fn new(breadcrumb: Vec<String>, metadata: JsonValue) -> Self {
        let metadata = match metadata {
            JsonValue::Object(map) => map,
            _ => JsonObject::new(),
        };
        Self {
            breadcrumb,
            metadata,
        }
    }
}

impl Resource {
    /// Breadcrumb metadata of this resource
    pub fn metadata(&self) -> Vec<MetadataEntry> {
        let mut stream = json!({
            "table-key-properties": self.key_properties,
            "forced-replication-method": self.replication_method.as_str(),
        });
        if let Some(key) = self.replication_key {
            stream["valid-replication-keys"] = json!([key]);
        }

        let mut entries = vec![MetadataEntry::new(Vec::new(), stream)];
        entries.extend(self.fields.iter().map(|(field, _)| {
            let inclusion = if self.is_automatic(field) {
                INCLUSION_AUTOMATIC
            } else {
                INCLUSION_AVAILABLE
            };
            MetadataEntry::new(
                vec!["properties".to_string(), (*field).to_string()],
                json!({ "inclusion": inclusion }),
            )
        }));
        entries
    }

    /// Catalog entry of this resource
    pub fn catalog_entry(&self) -> CatalogEntry {
        CatalogEntry {
            tap_stream_id: self.name.to_string(),
            stream: self.name.to_string(),
            key_properties: self.key_properties.iter().map(ToString::to_string).collect(),
            schema: self.schema(),
            metadata: self.metadata(),
        }
    }
}

impl CatalogEntry {
    /// Stream-level metadata
    pub fn stream_metadata(&self) -> Option<&JsonObject> {
        self.metadata
            .iter()
            .find(|entry| entry.breadcrumb.is_empty())
            .map(|entry| &entry.metadata)
    }

    /// Check whether the stream is marked `selected`
    pub fn is_selected(&self) -> bool {
        self.stream_metadata()
            .and_then(|m| m.get("selected"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }
}

impl Catalog {
    /// Catalog of every registered resource
    pub fn discover() -> Self {
        Self {
            streams: all().iter().map(Resource::catalog_entry).collect(),
        }
    }

    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read catalog {}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /// Parse a catalog document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid catalog: {e}")))
    }

    /// Names of the streams marked `selected`
    pub fn selected_streams(&self) -> Vec<String> {
        self.streams
            .iter()
            .filter(|entry| entry.is_selected())
            .map(|entry| entry.tap_stream_id.clone())
            .collect()
    }

    /// Find an entry by stream id
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|e| e.tap_stream_id == stream)
    }
}
