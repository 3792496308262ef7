//! Map configuration: a named-option bag with the marker, line and shape
//! type catalogs the editor styles features with.
//!
//! Options are plain JSON values. Accessors hand out owned copies, so no
//! caller can reach into a document's configuration through a leaked
//! reference.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::geojson::TypeFamily;

/// Named options for the map editor, including the three type catalogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapConfig {
    options: Map<String, Value>,
}

impl MapConfig {
    /// A configuration with no options at all.
    pub fn empty() -> Self {
        Self { options: Map::new() }
    }

    /// Built-in defaults overlaid with the supplied options.
    pub fn from_partial(options: Map<String, Value>) -> Self {
        let mut config = Self::default();
        for (key, value) in options {
            config.options.insert(key, value);
        }
        config
    }

    /// Look up an option. Returns an owned copy.
    pub fn option(&self, key: &str) -> Option<Value> {
        self.options.get(key).cloned()
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: Value) {
        self.options.insert(key.into(), value);
    }

    pub fn option_keys(&self) -> Vec<String> {
        self.options.keys().cloned().collect()
    }

    /// Iterate options without giving out mutable access.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The type catalog for a style family. Missing or non-array values
    /// read as an empty catalog.
    pub fn type_catalog(&self, family: TypeFamily) -> Vec<Value> {
        match self.options.get(family.catalog_key()) {
            Some(Value::Array(entries)) => entries.clone(),
            _ => Vec::new(),
        }
    }

    pub fn set_type_catalog(&mut self, family: TypeFamily, entries: Vec<Value>) {
        self.options
            .insert(family.catalog_key().to_string(), Value::Array(entries));
    }

    pub fn marker_types(&self) -> Vec<Value> {
        self.type_catalog(TypeFamily::Marker)
    }

    pub fn line_types(&self) -> Vec<Value> {
        self.type_catalog(TypeFamily::Line)
    }

    pub fn shape_types(&self) -> Vec<Value> {
        self.type_catalog(TypeFamily::Shape)
    }
}

impl Default for MapConfig {
    /// The demo configuration a fresh editor starts with: one preset per
    /// type catalog and the baseline viewport options.
    fn default() -> Self {
        let mut options = Map::new();
        options.insert(
            "marker_types".to_string(),
            json!([{ "title": "Marker", "color": "#70af00", "icon": "fa-map-marker" }]),
        );
        options.insert(
            "line_types".to_string(),
            json!([{ "title": "Line", "color": "#b42714", "weight": 2 }]),
        );
        options.insert(
            "shape_types".to_string(),
            json!([{ "title": "Shape", "color": "#b42714", "fill_opacity": 0.5 }]),
        );
        options.insert("map_init_zoom".to_string(), json!(14));
        options.insert(
            "map_init_centre".to_string(),
            json!([-128.427172, 50.782185]),
        );
        options.insert("show_scale".to_string(), json!(false));
        Self { options }
    }
}

impl From<Map<String, Value>> for MapConfig {
    fn from(options: Map<String, Value>) -> Self {
        Self::from_partial(options)
    }
}
