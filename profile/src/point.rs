use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt};

pub type LayerId = String;

/// Identifies one injected series value on a table row.
///
/// The hosting chart's data model keys series by composed field names
/// (`<layerId>y`, `<layerId>y_I_<feature>_<path>`, ...). Those names
/// are a convention, not a schema, so the key space is modeled as a
/// tagged value instead; [`fmt::Display`] renders the legacy field
/// name for export headers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKey {
    /// Selected profile-layer series.
    Profile { layer: LayerId },

    /// Elevation of one intersecting point feature.
    Point { layer: LayerId, feature: usize },

    /// Second elevation of a two-field intersecting point feature.
    Point2 { layer: LayerId, feature: usize },

    /// Connected sub-path of an intersecting line feature.
    Segment {
        layer: LayerId,
        feature: usize,
        path: usize,
    },

    /// Sub-path whose covered rows collapse to a single point.
    SegmentPoint {
        layer: LayerId,
        feature: usize,
        path: usize,
    },

    /// Isolated crossing point of an intersecting line feature.
    Detached {
        layer: LayerId,
        feature: usize,
        point: usize,
    },
}

impl SeriesKey {
    pub fn layer(&self) -> &str {
        match self {
            Self::Profile { layer }
            | Self::Point { layer, .. }
            | Self::Point2 { layer, .. }
            | Self::Segment { layer, .. }
            | Self::SegmentPoint { layer, .. }
            | Self::Detached { layer, .. } => layer,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile { layer } => write!(f, "{layer}y"),
            Self::Point { layer, feature } => write!(f, "{layer}{feature}y"),
            Self::Point2 { layer, feature } => write!(f, "{layer}{feature}y2"),
            Self::Segment {
                layer,
                feature,
                path,
            } => write!(f, "{layer}y_I_{feature}_{path}"),
            Self::SegmentPoint {
                layer,
                feature,
                path,
            } => write!(f, "{layer}y-point_{feature}_{path}"),
            Self::Detached {
                layer,
                feature,
                point,
            } => write!(f, "{layer}y-point_{feature}_{point}_d"),
        }
    }
}

impl Serialize for SeriesKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One row of the profile table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElevationPoint {
    /// Distance from path start, in the selected linear unit.
    pub x: f64,

    /// Ground elevation, in the selected elevation unit.
    pub y: f64,

    /// Volumetric-object elevation sampled in parallel, if any.
    pub view_y: Option<f64>,

    /// Map-space position, carried through for highlighting.
    pub map_x: f64,
    pub map_y: f64,

    /// Stable index into the original sample sequence. Never
    /// reassigned; join key for all lookup side-tables.
    pub point_index: usize,

    /// Profile layer covering this row, set by the profile-layer
    /// injector and consumed by the match-profile fallback.
    pub profile_layer: Option<LayerId>,

    /// Per-layer series values injected for this row.
    pub series: BTreeMap<SeriesKey, f64>,
}

impl ElevationPoint {
    pub fn series_value(&self, key: &SeriesKey) -> Option<f64> {
        self.series.get(key).copied()
    }

    /// Value of the profile-layer series covering this row, if any.
    pub(crate) fn profile_value(&self) -> Option<f64> {
        let layer = self.profile_layer.clone()?;
        self.series_value(&SeriesKey::Profile { layer })
    }
}
