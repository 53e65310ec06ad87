//! Recursive epoch-to-string rewriting

use super::zone::DisplayZone;
use crate::types::{JsonObject, JsonValue};
use serde_json::Number;
use tracing::debug;

/// Field names holding epoch-millisecond timestamps in Onfleet payloads
pub const TIMESTAMP_FIELDS: [&str; 4] = ["timeCreated", "timeLastModified", "timeLastSeen", "time"];

/// Rewrites known timestamp fields anywhere inside a JSON document
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampNormalizer {
    zone: DisplayZone,
}

impl TimestampNormalizer {
    /// Create a normalizer rendering in the given zone
    pub fn new(zone: DisplayZone) -> Self {
        Self { zone }
    }

    /// Zone used for rendering
    pub fn zone(&self) -> DisplayZone {
        self.zone
    }

    /// Normalize any JSON value
    ///
    /// Objects are rewritten field by field. Arrays have their object elements
    /// normalized; scalars and nested arrays pass through untouched.
    pub fn normalize(&self, value: JsonValue) -> JsonValue {
        match value {
            JsonValue::Object(map) => JsonValue::Object(self.normalize_object(map)),
            JsonValue::Array(items) => JsonValue::Array(self.normalize_array(items)),
            other => other,
        }
    }

    /// Normalize every object of a page
    pub fn normalize_all(&self, records: Vec<JsonValue>) -> Vec<JsonValue> {
        self.normalize_array(records)
    }

    fn normalize_object(&self, map: JsonObject) -> JsonObject {
        map.into_iter()
            .map(|(key, value)| {
                let value = if TIMESTAMP_FIELDS.contains(&key.as_str()) {
                    self.convert_field(&key, value)
                } else {
                    match value {
                        JsonValue::Object(inner) => JsonValue::Object(self.normalize_object(inner)),
                        JsonValue::Array(items) => JsonValue::Array(self.normalize_array(items)),
                        other => other,
                    }
                };
                (key, value)
            })
            .collect()
    }

    fn normalize_array(&self, items: Vec<JsonValue>) -> Vec<JsonValue> {
        items
            .into_iter()
            .map(|item| match item {
                JsonValue::Object(map) => JsonValue::Object(self.normalize_object(map)),
                other => other,
            })
            .collect()
    }

    fn convert_field(&self, key: &str, value: JsonValue) -> JsonValue {
        let JsonValue::Number(number) = &value else {
            return value;
        };

        match epoch_millis(number).and_then(|ms| self.zone.format_millis(ms)) {
            Some(rendered) => JsonValue::String(rendered),
            None => {
                debug!(field = key, value = %number, "timestamp out of range, left as-is");
                value
            }
        }
    }
}

fn epoch_millis(number: &Number) -> Option<i64> {
    number
        .as_i64()
        .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}
