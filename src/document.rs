//! The editable document - THE source of truth for all map data.
//!
//! Every edit goes through this document. It wraps the GeoJSON feature
//! collection and the map configuration, and every mutation rebuilds the
//! feature sequence so a swapped document is always a fresh value with no
//! structure shared with its predecessor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::MapConfig;
use crate::geojson::{Feature, TypeFamily};

/// The `type` member every serialized document carries.
pub const COLLECTION_KIND: &str = "FeatureCollection";

/// Key the external map library expects its configuration under in the
/// collection's `properties`.
pub const EDITOR_CONFIG_KEY: &str = "waymark_config";

/// The complete editable state: features plus configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    features: Vec<Feature>,
    config: MapConfig,
}

fn collection_kind() -> String {
    COLLECTION_KIND.to_string()
}

/// Serialized shape of a document, as persisted and exported.
#[derive(Serialize, Deserialize)]
struct DocumentWire {
    #[serde(rename = "type", default = "collection_kind")]
    kind: String,
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    properties: WireProperties,
}

#[derive(Serialize, Deserialize, Default)]
struct WireProperties {
    #[serde(rename = "waymark_config", default, skip_serializing_if = "Option::is_none")]
    config: Option<MapConfig>,
}

impl Document {
    pub fn new(features: Vec<Feature>, config: MapConfig) -> Self {
        Self { features, config }
    }

    // --- Features ---

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Replace the full feature list. `None` normalizes to empty.
    pub fn set_features(&mut self, features: Option<Vec<Feature>>) {
        self.features = features.unwrap_or_default();
    }

    pub fn feature_by_id(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.matches_id(id))
    }

    /// Replace the feature with the given id. Returns false and leaves
    /// the sequence untouched when the id is absent.
    pub fn update_feature(&mut self, id: &str, feature: Feature) -> bool {
        let Some(index) = self.features.iter().position(|f| f.matches_id(id)) else {
            return false;
        };
        let mut next = self.features.clone();
        next[index] = feature;
        self.features = next;
        true
    }

    /// Merge `properties` into the matching feature's properties.
    /// The merge is shallow at the top property level: a supplied key
    /// replaces the existing value wholesale, nested objects are not
    /// merged recursively.
    pub fn update_feature_properties(&mut self, id: &str, properties: Map<String, Value>) -> bool {
        let Some(index) = self.features.iter().position(|f| f.matches_id(id)) else {
            return false;
        };
        let mut next = self.features.clone();
        let mut feature = next[index].clone();
        for (key, value) in properties {
            feature.properties.insert(key, value);
        }
        next[index] = feature;
        self.features = next;
        true
    }

    pub fn add_feature(&mut self, feature: Feature) {
        let mut next = self.features.clone();
        next.push(feature);
        self.features = next;
    }

    /// Remove the feature with the given id. Returns false when nothing
    /// was removed.
    pub fn remove_feature(&mut self, id: &str) -> bool {
        let before = self.features.len();
        let next: Vec<Feature> = self
            .features
            .iter()
            .filter(|f| !f.matches_id(id))
            .cloned()
            .collect();
        self.features = next;
        before != self.features.len()
    }

    pub fn has_features(&self) -> bool {
        !self.features.is_empty()
    }

    // --- Configuration ---

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Replace the configuration. Accepts a full `MapConfig` or, via
    /// `From`, a plain options object overlaid on the defaults.
    pub fn set_config(&mut self, config: impl Into<MapConfig>) {
        self.config = config.into();
    }

    pub fn config_option(&self, key: &str) -> Option<Value> {
        self.config.option(key)
    }

    pub fn set_config_option(&mut self, key: impl Into<String>, value: Value) {
        self.config.set_option(key, value);
    }

    pub fn type_catalog(&self, family: TypeFamily) -> Vec<Value> {
        self.config.type_catalog(family)
    }

    pub fn set_type_catalog(&mut self, family: TypeFamily, entries: Vec<Value>) {
        self.config.set_type_catalog(family, entries);
    }

    pub fn marker_types(&self) -> Vec<Value> {
        self.config.marker_types()
    }

    pub fn line_types(&self) -> Vec<Value> {
        self.config.line_types()
    }

    pub fn shape_types(&self) -> Vec<Value> {
        self.config.shape_types()
    }

    pub fn set_marker_types(&mut self, entries: Vec<Value>) {
        self.set_type_catalog(TypeFamily::Marker, entries);
    }

    pub fn set_line_types(&mut self, entries: Vec<Value>) {
        self.set_type_catalog(TypeFamily::Line, entries);
    }

    pub fn set_shape_types(&mut self, entries: Vec<Value>) {
        self.set_type_catalog(TypeFamily::Shape, entries);
    }

    // --- Serialization ---

    /// The serializable GeoJSON form: features plus the configuration
    /// under the external editor's expected key.
    pub fn to_geojson(&self) -> Value {
        let wire = DocumentWire {
            kind: collection_kind(),
            features: self.features.clone(),
            properties: WireProperties { config: Some(self.config.clone()) },
        };
        serde_json::to_value(wire).expect("document serializes to JSON")
    }

    /// Strict deserialization. Callers that must distinguish malformed
    /// input from a valid document (the import pipeline) use this and
    /// decide what to do with the error.
    pub fn try_from_geojson(value: &Value) -> anyhow::Result<Document> {
        if value.is_null() {
            anyhow::bail!("no document value");
        }
        let kind = value.get("type").and_then(Value::as_str);
        if kind != Some(COLLECTION_KIND) {
            anyhow::bail!("not a {COLLECTION_KIND}: type is {kind:?}");
        }
        let wire: DocumentWire = serde_json::from_value(value.clone())?;
        Ok(Document {
            features: wire.features,
            config: wire.properties.config.unwrap_or_default(),
        })
    }

    /// Rebuild a document from its serialized form, substituting the
    /// default empty document for anything malformed. Never fails.
    pub fn from_geojson(value: &Value) -> Document {
        match Self::try_from_geojson(value) {
            Ok(document) => document,
            Err(error) => {
                tracing::warn!(%error, "invalid document value, starting empty");
                Document::default()
            }
        }
    }

    /// As [`Document::from_geojson`], from raw JSON text.
    pub fn from_geojson_str(raw: &str) -> Document {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_geojson(&value),
            Err(error) => {
                tracing::warn!(%error, "unparsable document text, starting empty");
                Document::default()
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            config: MapConfig::default(),
        }
    }
}
