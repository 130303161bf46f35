use geo::geometry::{Coord, LineString, Point};
use profile::{
    AssetGeometry, AssetLayerConfig, Attributes, EffectiveUnits, GroundSample, GroundStats,
    IntersectionHit, IntersectionSource, MapProjection, PathGeometry, PointGeometry,
    ProfileLayerConfig, QueryError, RebuildInput, SelectedFeature, SelectedUnits,
};
use serde::Deserialize;
use std::collections::HashMap;

/// A self-contained profile scenario: ground samples, the drawn path,
/// layer settings, and canned intersection results keyed by layer.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub samples: Vec<GroundSample>,
    #[serde(default)]
    pub view_elevations: Option<Vec<f64>>,
    pub effective: EffectiveUnits,
    pub selected: SelectedUnits,
    pub path: ScenarioPath,
    pub projection: MapProjection,
    #[serde(default)]
    pub selected_features: Vec<ScenarioFeature>,
    #[serde(default)]
    pub profile_layers: Vec<ProfileLayerConfig>,
    #[serde(default)]
    pub asset_layers: Vec<AssetLayerConfig>,
    #[serde(default)]
    pub intersections: HashMap<String, Vec<ScenarioHit>>,
    #[serde(default)]
    pub stats: Option<GroundStats>,
}

impl Scenario {
    pub fn into_parts(self) -> (RebuildInput, ScenarioSource) {
        let input = RebuildInput {
            samples: self.samples,
            view_elevations: self.view_elevations,
            effective: self.effective,
            selected: self.selected,
            path: self.path.into_geometry(),
            projection: self.projection,
            selected_features: self
                .selected_features
                .into_iter()
                .map(ScenarioFeature::into_feature)
                .collect(),
            profile_layers: self.profile_layers,
            asset_layers: self.asset_layers,
            stats: self.stats,
        };
        let hits = self
            .intersections
            .into_iter()
            .map(|(layer, hits)| {
                (
                    layer,
                    hits.into_iter().map(ScenarioHit::into_hit).collect(),
                )
            })
            .collect();
        (input, ScenarioSource { hits })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: Option<f64>,
}

impl Vertex {
    fn coord(self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    fn point(self) -> PointGeometry {
        PointGeometry {
            point: Point::new(self.x, self.y),
            z: self.z,
        }
    }
}

/// Multipart polyline as plain vertices; becomes a [`PathGeometry`]
/// with z vectors when every vertex carries one.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioPath {
    pub paths: Vec<Vec<Vertex>>,
}

impl ScenarioPath {
    pub fn into_geometry(self) -> PathGeometry {
        let has_z = !self.paths.is_empty()
            && self
                .paths
                .iter()
                .flatten()
                .all(|vertex| vertex.z.is_some());
        let z = has_z.then(|| {
            self.paths
                .iter()
                .map(|path| path.iter().map(|v| v.z.unwrap_or(0.0)).collect())
                .collect()
        });
        let paths = self
            .paths
            .into_iter()
            .map(|path| LineString::from(path.into_iter().map(Vertex::coord).collect::<Vec<_>>()))
            .collect();
        PathGeometry { paths, z }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScenarioFeature {
    pub layer_id: String,
    pub geometry: ScenarioPath,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ScenarioFeature {
    fn into_feature(self) -> SelectedFeature {
        SelectedFeature {
            layer_id: self.layer_id,
            geometry: self.geometry.into_geometry(),
            attributes: self.attributes,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScenarioGeometry {
    Point {
        x: f64,
        y: f64,
        #[serde(default)]
        z: Option<f64>,
    },
    Line {
        paths: Vec<Vec<Vertex>>,
    },
}

#[derive(Debug, Deserialize)]
pub struct ScenarioHit {
    pub geometry: ScenarioGeometry,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub display_value: Option<String>,
    #[serde(default)]
    pub connected: Vec<ScenarioPath>,
    #[serde(default)]
    pub disconnected: Vec<Vertex>,
}

impl ScenarioHit {
    fn into_hit(self) -> IntersectionHit {
        let geometry = match self.geometry {
            ScenarioGeometry::Point { x, y, z } => {
                AssetGeometry::Point(Vertex { x, y, z }.point())
            }
            ScenarioGeometry::Line { paths } => {
                AssetGeometry::Line(ScenarioPath { paths }.into_geometry())
            }
        };
        IntersectionHit {
            geometry,
            attributes: self.attributes,
            display_value: self.display_value,
            connected: self
                .connected
                .into_iter()
                .map(ScenarioPath::into_geometry)
                .collect(),
            disconnected: self
                .disconnected
                .into_iter()
                .map(Vertex::point)
                .collect(),
        }
    }
}

/// Serves the scenario's canned intersections; layers without an
/// entry intersect nothing.
pub struct ScenarioSource {
    hits: HashMap<String, Vec<IntersectionHit>>,
}

impl IntersectionSource for ScenarioSource {
    fn query(
        &self,
        config: &AssetLayerConfig,
        _path: &PathGeometry,
    ) -> Result<Vec<IntersectionHit>, QueryError> {
        Ok(self
            .hits
            .get(&config.layer_id)
            .cloned()
            .unwrap_or_default())
    }
}
