use crate::point::LayerId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use units::LinearUnit;

/// Numeric feature attributes. `None` models a null attribute value.
pub type Attributes = HashMap<String, Option<f64>>;

/// How an injector derives an elevation value for a layer's features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ElevationRule {
    /// Per-vertex z values from the feature geometry, expressed in
    /// the map spatial reference's vertical unit.
    Z,

    /// Constant value from one attribute field.
    OneField { field1: String, unit: LinearUnit },

    /// Linear interpolation between two attribute fields across the
    /// feature.
    TwoField {
        field1: String,
        field2: String,
        unit: LinearUnit,
    },

    /// Use the covering profile layer's value, else ground.
    MatchProfile,

    /// Ground elevation at the row.
    None,
}

/// How a selected feature's length along the path is measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DistanceRule {
    /// Length of the feature geometry under the map projection.
    Map,

    /// Length read from an attribute field. A non-numeric or missing
    /// value contributes zero length.
    Field { field: String, unit: LinearUnit },
}

/// Elevation placement mode of the layer hosting the drawn path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElevationMode {
    Absolute,
    RelativeToGround,
    RelativeToScene,
    OnTheGround,
}

impl Default for ElevationMode {
    fn default() -> Self {
        Self::Absolute
    }
}

/// Marker rendered for an intersecting asset. Carried as data through
/// the intersection index for the host's tooltip and legend; never
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerShape {
    Circle,
    Square,
    Rectangle,
    Triangle,
    SolidLine,
    DottedLine,
    DashedLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub color: String,
    pub size: Option<f64>,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            shape: MarkerShape::Circle,
            color: "#000000".to_string(),
            size: None,
        }
    }
}

/// Settings for one selectable profile line layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileLayerConfig {
    pub layer_id: LayerId,
    pub elevation: ElevationRule,
    #[serde(default = "DistanceRule::map")]
    pub distance: DistanceRule,
    #[serde(default)]
    pub elevation_mode: ElevationMode,
}

impl DistanceRule {
    fn map() -> Self {
        Self::Map
    }
}

/// Settings for one intersecting asset layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetLayerConfig {
    pub layer_id: LayerId,
    pub title: String,
    pub elevation: ElevationRule,
    #[serde(default)]
    pub display_field: Option<String>,
    #[serde(default)]
    pub style: MarkerStyle,

    /// Rows-covered count at or below which a line sub-path renders
    /// as an isolated point rather than a line segment.
    #[serde(default = "default_segment_point_threshold")]
    pub segment_point_threshold: usize,
}

fn default_segment_point_threshold() -> usize {
    1
}
