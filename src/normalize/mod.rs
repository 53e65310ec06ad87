//! Timestamp normalization module
//!
//! Onfleet reports every timestamp as milliseconds since the Unix epoch.
//! Records leaving the tap carry them as `YYYY-MM-DD HH:MM:SS` strings instead.
//!
//! # Overview
//!
//! - `TimestampNormalizer` - Recursively rewrites the known timestamp fields
//! - `DisplayZone` - Time zone used to render and to interpret naive date-times
//! - `parse_datetime` - Lenient date-time parser shared by bookmarks and requests

mod normalizer;
mod zone;

pub use normalizer::{TimestampNormalizer, TIMESTAMP_FIELDS};
pub use zone::{parse_datetime, DisplayZone, DATETIME_FORMAT};
