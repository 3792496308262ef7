//! Bridge to the external map-editing library.
//!
//! The external editor owns live geometry editing and rendering; this
//! core only ever replaces the whole document. The bridge contract is
//! what the core needs for that: push configuration, push features,
//! preserve the viewport across a reload, and delegate file formats the
//! core does not parse itself.

use serde_json::{json, Map, Value};

use crate::config::MapConfig;
use crate::document::{Document, COLLECTION_KIND};
use crate::geojson::Feature;

/// South-west / north-east corner pair, in lon-lat order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: [f64; 2],
    pub north_east: [f64; 2],
}

impl Default for Bounds {
    fn default() -> Self {
        Self { south_west: [-180.0, -90.0], north_east: [180.0, 90.0] }
    }
}

/// Contract the external map editor fulfils toward the core.
///
/// The editor calls back into the state store's edit-commit entry point
/// whenever the user finishes an edit gesture; that direction is wired
/// by the embedding application, not by this trait.
pub trait MapEditor {
    /// One-time setup with the document's configuration.
    fn init(&mut self, config: &MapConfig);

    /// Load a bare feature collection into the editor.
    fn load(&mut self, collection: Value);

    /// Drop all rendered geometry.
    fn clear(&mut self);

    fn bounds(&self) -> Bounds;

    fn zoom(&self) -> f64;

    fn fit_bounds(&mut self, bounds: Bounds);

    fn set_zoom(&mut self, zoom: f64);

    /// Mirror one configuration option into the editor's own store.
    fn set_option(&mut self, key: &str, value: Value);

    /// Hand raw file contents to the editor's own format importer. The
    /// editor re-commits through the normal edit path once parsed.
    fn load_file_contents(&mut self, contents: &str, extension: &str);
}

/// Bare feature collection for the editor, without the config envelope.
pub fn feature_collection(features: &[Feature]) -> Value {
    json!({
        "type": COLLECTION_KIND,
        "features": serde_json::to_value(features).expect("features serialize to JSON"),
    })
}

/// Reload the editor from a document while keeping the viewport still.
///
/// Order matters: capture the viewport, mirror every config option,
/// clear, restore the viewport, then load. Loading before the viewport
/// is restored makes the map visibly jump.
pub fn redraw(editor: &mut dyn MapEditor, document: &Document) {
    let bounds = editor.bounds();
    let zoom = editor.zoom();

    for (key, value) in document.config().entries() {
        editor.set_option(key, value.clone());
    }

    editor.clear();
    editor.fit_bounds(bounds);
    editor.set_zoom(zoom);
    editor.load(feature_collection(document.features()));
}

/// In-memory editor for headless runs: mirrors options and the loaded
/// collection, and tracks the viewport, without rendering anything.
#[derive(Debug)]
pub struct HeadlessEditor {
    options: Map<String, Value>,
    loaded: Option<Value>,
    bounds: Bounds,
    zoom: f64,
}

impl HeadlessEditor {
    pub fn new() -> Self {
        Self {
            options: Map::new(),
            loaded: None,
            bounds: Bounds::default(),
            zoom: 2.0,
        }
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn loaded(&self) -> Option<&Value> {
        self.loaded.as_ref()
    }
}

impl Default for HeadlessEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MapEditor for HeadlessEditor {
    fn init(&mut self, config: &MapConfig) {
        for (key, value) in config.entries() {
            self.options.insert(key.to_string(), value.clone());
        }
    }

    fn load(&mut self, collection: Value) {
        self.loaded = Some(collection);
    }

    fn clear(&mut self) {
        self.loaded = None;
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    fn set_option(&mut self, key: &str, value: Value) {
        self.options.insert(key.to_string(), value);
    }

    fn load_file_contents(&mut self, _contents: &str, extension: &str) {
        tracing::warn!(extension, "no delegated importer in headless mode, dropped");
    }
}

/// Editor double that journals every call, for asserting call order.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingEditor {
    pub calls: Vec<String>,
    pub options: Map<String, Value>,
    pub loaded: Option<Value>,
    pub delegated: Vec<(String, String)>,
}

#[cfg(test)]
impl MapEditor for RecordingEditor {
    fn init(&mut self, _config: &MapConfig) {
        self.calls.push("init".to_string());
    }

    fn load(&mut self, collection: Value) {
        self.calls.push("load".to_string());
        self.loaded = Some(collection);
    }

    fn clear(&mut self) {
        self.calls.push("clear".to_string());
        self.loaded = None;
    }

    fn bounds(&self) -> Bounds {
        Bounds::default()
    }

    fn zoom(&self) -> f64 {
        5.0
    }

    fn fit_bounds(&mut self, _bounds: Bounds) {
        self.calls.push("fit_bounds".to_string());
    }

    fn set_zoom(&mut self, _zoom: f64) {
        self.calls.push("set_zoom".to_string());
    }

    fn set_option(&mut self, key: &str, value: Value) {
        self.calls.push(format!("set_option:{key}"));
        self.options.insert(key.to_string(), value);
    }

    fn load_file_contents(&mut self, contents: &str, extension: &str) {
        self.calls.push("load_file_contents".to_string());
        self.delegated.push((contents.to_string(), extension.to_string()));
    }
}
