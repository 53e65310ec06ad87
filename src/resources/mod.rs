//! Resource registry module
//!
//! The six Onfleet resources the tap can replicate, their schemas and the
//! Singer catalog built from them.
//!
//! # Overview
//!
//! - `Resource` - static descriptor (path, replication, pagination, fields)
//! - `Catalog` - discovery output with per-field metadata
//! - `find` / `select` - lookup by stream name in registry order

mod catalog;
mod registry;

pub use catalog::{Catalog, CatalogEntry, MetadataEntry, INCLUSION_AUTOMATIC, INCLUSION_AVAILABLE};
pub use registry::{all, find, select, FieldType, Resource, REPLICATION_KEY};
