//! GeoJSON feature and geometry types.
//!
//! Coordinates are carried as raw JSON values. The core never interprets
//! them, it only routes geometry to the matching style family, so any
//! valid GeoJSON round-trips byte for byte through the document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GeoJSON geometry, discriminated by the `type` member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Value },
    MultiPoint { coordinates: Value },
    LineString { coordinates: Value },
    MultiLineString { coordinates: Value },
    Polygon { coordinates: Value },
    MultiPolygon { coordinates: Value },
    GeometryCollection { geometries: Vec<Geometry> },
}

/// Style family a geometry belongs to. Each family has its own type
/// catalog in the map configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Marker,
    Line,
    Shape,
}

impl TypeFamily {
    pub const ALL: [TypeFamily; 3] = [TypeFamily::Marker, TypeFamily::Line, TypeFamily::Shape];

    /// Configuration key of the family's type catalog.
    pub fn catalog_key(self) -> &'static str {
        match self {
            TypeFamily::Marker => "marker_types",
            TypeFamily::Line => "line_types",
            TypeFamily::Shape => "shape_types",
        }
    }
}

impl Geometry {
    /// Which style family this geometry is styled by.
    /// Geometry collections carry no single style and map to none.
    pub fn family(&self) -> Option<TypeFamily> {
        match self {
            Geometry::Point { .. } | Geometry::MultiPoint { .. } => Some(TypeFamily::Marker),
            Geometry::LineString { .. } | Geometry::MultiLineString { .. } => {
                Some(TypeFamily::Line)
            }
            Geometry::Polygon { .. } | Geometry::MultiPolygon { .. } => Some(TypeFamily::Shape),
            Geometry::GeometryCollection { .. } => None,
        }
    }
}

fn feature_discriminator() -> String {
    "Feature".to_string()
}

/// A single geometry plus properties record, GeoJSON-shaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_discriminator")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Build a feature from a geometry and properties.
    pub fn new(geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_discriminator(),
            id: None,
            geometry: Some(geometry),
            properties,
        }
    }

    /// Whether this feature answers to `id`. The top-level `id` member
    /// wins, `properties.id` is the fallback. Numeric ids match their
    /// textual form.
    pub fn matches_id(&self, id: &str) -> bool {
        value_matches_id(self.id.as_ref(), id) || value_matches_id(self.properties.get("id"), id)
    }

    /// The `properties.type` value referencing a type-catalog entry.
    pub fn style_type(&self) -> Option<&str> {
        self.properties.get("type").and_then(Value::as_str)
    }

    /// Style family of this feature's geometry, if it has one.
    pub fn family(&self) -> Option<TypeFamily> {
        self.geometry.as_ref().and_then(Geometry::family)
    }
}

fn value_matches_id(value: Option<&Value>, id: &str) -> bool {
    match value {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    }
}
