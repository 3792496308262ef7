//! State core for a geographic-feature editor.
//!
//! The live editing surface (pan, zoom, drawing) belongs to an external
//! map library reached through [`bridge::MapEditor`]. This crate owns
//! everything around it:
//!
//! - [`document::Document`] - the feature collection plus configuration,
//!   the single source of truth
//! - [`history::History`] - bounded undo/redo over serialized snapshots
//! - [`storage`] - durable persistence of the current document
//! - [`import`] / [`export`] - the GeoJSON file pipeline
//! - [`store::StateStore`] - the owned register tying them together
//!
//! Atomicity is structural: every change constructs a whole new document
//! and swaps it in, so observers never see a partially applied edit.

pub mod bridge;
pub mod config;
pub mod document;
pub mod export;
pub mod geojson;
pub mod history;
pub mod import;
pub mod storage;
pub mod store;

pub use config::MapConfig;
pub use document::Document;
pub use geojson::{Feature, Geometry, TypeFamily};
pub use store::StateStore;
