//! Static resource descriptors

use crate::error::{Error, Result};
use crate::pagination::Pagination;
use crate::types::{JsonObject, JsonValue, ReplicationMethod};
use serde_json::json;

/// Replication key shared by every incremental resource
pub const REPLICATION_KEY: &str = "timeLastModified";

const KEY_PROPERTIES: &[&str] = &["id"];

/// Declared type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// Epoch timestamp rendered as text by the normalizer
    DateTime,
}

impl FieldType {
    /// Nullable JSON schema for this type
    pub fn schema(self) -> JsonValue {
        match self {
            Self::String => json!({"type": ["null", "string"]}),
            Self::Integer => json!({"type": ["null", "integer"]}),
            Self::Number => json!({"type": ["null", "number"]}),
            Self::Boolean => json!({"type": ["null", "boolean"]}),
            Self::Object => json!({"type": ["null", "object"], "additionalProperties": true}),
            Self::Array => json!({"type": ["null", "array"]}),
            Self::DateTime => json!({"type": ["null", "string"], "format": "date-time"}),
        }
    }
}

/// A replicable Onfleet resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Stream name
    pub name: &'static str,
    /// API path under the versioned base
    pub path: &'static str,
    /// Full table or incremental
    pub replication_method: ReplicationMethod,
    /// Field driving the bookmark (incremental only)
    pub replication_key: Option<&'static str>,
    /// Primary key fields
    pub key_properties: &'static [&'static str],
    /// How the endpoint pages
    pub pagination: Pagination,
    /// Declared fields
    pub fields: &'static [(&'static str, FieldType)],
}

impl Resource {
    /// Check if the resource keeps a bookmark
    pub fn is_incremental(&self) -> bool {
        self.replication_method == ReplicationMethod::Incremental
    }

    /// JSON schema of a record
    pub fn schema(&self) -> JsonValue {
        let properties: JsonObject = self
            .fields
            .iter()
            .map(|(name, field_type)| ((*name).to_string(), field_type.schema()))
            .collect();

        json!({
            "type": ["null", "object"],
            "additionalProperties": true,
            "properties": properties
        })
    }

    /// Check whether a field is always emitted
    pub fn is_automatic(&self, field: &str) -> bool {
        self.key_properties.contains(&field) || self.replication_key == Some(field)
    }
}

use FieldType::{Array, Boolean, DateTime, Integer, Number, Object, String as Text};

static RESOURCES: [Resource; 6] = [
    Resource {
        name: "administrators",
        path: "admins",
        replication_method: ReplicationMethod::Incremental,
        replication_key: Some(REPLICATION_KEY),
        key_properties: KEY_PROPERTIES,
        pagination: Pagination::SinglePage,
        fields: &[
            ("id", Text),
            ("timeCreated", DateTime),
            ("timeLastModified", DateTime),
            ("organization", Text),
            ("email", Text),
            ("type", Text),
            ("name", Text),
            ("isActive", Boolean),
            ("isReadOnly", Boolean),
            ("phone", Text),
            ("metadata", Array),
        ],
    },
    Resource {
        name: "hubs",
        path: "hubs",
        replication_method: ReplicationMethod::FullTable,
        replication_key: None,
        key_properties: KEY_PROPERTIES,
        pagination: Pagination::SinglePage,
        fields: &[
            ("id", Text),
            ("name", Text),
            ("location", Array),
            ("address", Object),
            ("teams", Array),
        ],
    },
    Resource {
        name: "organizations",
        path: "organization",
        replication_method: ReplicationMethod::Incremental,
        replication_key: Some(REPLICATION_KEY),
        key_properties: KEY_PROPERTIES,
        pagination: Pagination::SinglePage,
        fields: &[
            ("id", Text),
            ("timeCreated", DateTime),
            ("timeLastModified", DateTime),
            ("name", Text),
            ("email", Text),
            ("image", Text),
            ("timezone", Text),
            ("country", Text),
            ("delegatees", Array),
        ],
    },
    Resource {
        name: "tasks",
        path: "tasks/all",
        replication_method: ReplicationMethod::Incremental,
        replication_key: Some(REPLICATION_KEY),
        key_properties: KEY_PROPERTIES,
        pagination: Pagination::TimestampCursor,
        fields: &[
            ("id", Text),
            ("timeCreated", DateTime),
            ("timeLastModified", DateTime),
            ("organization", Text),
            ("shortId", Text),
            ("trackingURL", Text),
            ("worker", Text),
            ("merchant", Text),
            ("executor", Text),
            ("creator", Text),
            ("dependencies", Array),
            ("state", Integer),
            ("completeAfter", Integer),
            ("completeBefore", Integer),
            ("pickupTask", Boolean),
            ("notes", Text),
            ("completionDetails", Object),
            ("feedback", Array),
            ("metadata", Array),
            ("overrides", Object),
            ("quantity", Number),
            ("serviceTime", Number),
            ("trackingViewed", Boolean),
            ("recipients", Array),
            ("destination", Object),
            ("container", Object),
            ("estimatedCompletionTime", Integer),
            ("estimatedArrivalTime", Integer),
        ],
    },
    Resource {
        name: "teams",
        path: "teams",
        replication_method: ReplicationMethod::Incremental,
        replication_key: Some(REPLICATION_KEY),
        key_properties: KEY_PROPERTIES,
        pagination: Pagination::SinglePage,
        fields: &[
            ("id", Text),
            ("timeCreated", DateTime),
            ("timeLastModified", DateTime),
            ("name", Text),
            ("workers", Array),
            ("managers", Array),
            ("hub", Text),
            ("enableSelfAssignment", Boolean),
        ],
    },
    Resource {
        name: "workers",
        path: "workers",
        replication_method: ReplicationMethod::Incremental,
        replication_key: Some(REPLICATION_KEY),
        key_properties: KEY_PROPERTIES,
        pagination: Pagination::IdCursor,
        fields: &[
            ("id", Text),
            ("timeCreated", DateTime),
            ("timeLastModified", DateTime),
            ("timeLastSeen", DateTime),
            ("organization", Text),
            ("name", Text),
            ("displayName", Text),
            ("phone", Text),
            ("activeTask", Text),
            ("tasks", Array),
            ("onDuty", Boolean),
            ("capacity", Number),
            ("userData", Object),
            ("accountStatus", Text),
            ("metadata", Array),
            ("imageUrl", Text),
            ("teams", Array),
            ("location", Array),
            ("vehicle", Object),
            ("delayTime", Number),
        ],
    },
];

/// Every resource in registry order
pub fn all() -> &'static [Resource] {
    &RESOURCES
}

/// Look up a resource by stream name
pub fn find(name: &str) -> Result<&'static Resource> {
    RESOURCES
        .iter()
        .find(|r| r.name == name)
        .ok_or_else(|| Error::ResourceNotFound {
            resource: name.to_string(),
        })
}

/// Resolve stream names, keeping registry order; empty selects everything
pub fn select<S: AsRef<str>>(names: &[S]) -> Result<Vec<&'static Resource>> {
    if names.is_empty() {
        return Ok(RESOURCES.iter().collect());
    }

    for name in names {
        find(name.as_ref())?;
    }
    Ok(RESOURCES
        .iter()
        .filter(|r| names.iter().any(|n| n.as_ref() == r.name))
        .collect())
}
