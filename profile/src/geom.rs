use geo::{
    algorithm::{EuclideanLength, HaversineLength},
    geometry::{Coord, Line, LineString, Point},
};
use serde::{Deserialize, Serialize};
use units::{LinearUnit, UnitError};

/// Lengths whose magnitude falls into scientific `e-` territory are
/// geometry-engine noise; treat them as zero.
const LENGTH_EPSILON: f64 = 1e-6;

const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Spatial-reference class of the hosting map. Decides whether
/// lengths are geodesic or planar, and how feature z values scale to
/// meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MapProjection {
    /// Longitude/latitude coordinates.
    Geographic,

    /// Web-Mercator meters.
    WebMercator,

    /// Projected planar spatial reference with the given meters per
    /// SR unit.
    Planar { meters_per_unit: f64 },
}

impl MapProjection {
    /// Meters per vertical SR unit; feature z values are multiplied
    /// by this before elevation-unit conversion.
    pub fn meters_per_vertical_unit(self) -> f64 {
        match self {
            Self::Geographic | Self::WebMercator => 1.0,
            Self::Planar { meters_per_unit } => meters_per_unit,
        }
    }

    /// Length of `line` in `unit`. Geodesic when the spatial
    /// reference is geographic or web-Mercator, planar otherwise.
    pub fn length(self, line: &LineString<f64>, unit: LinearUnit) -> Result<f64, UnitError> {
        let meters = match self {
            Self::Geographic => line.haversine_length(),
            Self::WebMercator => {
                let lonlat: LineString<f64> =
                    line.coords().map(|&c| unproject_web_mercator(c)).collect();
                lonlat.haversine_length()
            }
            Self::Planar { meters_per_unit } => line.euclidean_length() * meters_per_unit,
        };
        Ok(clamp_tiny(units::convert(
            meters,
            LinearUnit::Meters,
            unit,
        )?))
    }

    /// Distance from the start of `path` to the point on it nearest
    /// to `point`, in `unit`. Returns `None` for an empty path.
    pub fn distance_along(
        self,
        path: &PathGeometry,
        point: Point<f64>,
        unit: LinearUnit,
    ) -> Result<Option<f64>, UnitError> {
        let Some(nearest) = nearest_on_path(path, point) else {
            return Ok(None);
        };
        let mut total = 0.0;
        for (part_index, part) in path.paths.iter().enumerate() {
            if part_index < nearest.part {
                total += self.length(part, unit)?;
                continue;
            }
            for (segment_index, segment) in part.lines().enumerate() {
                if segment_index < nearest.segment {
                    total += self.length(&two_point_line(segment.start, segment.end), unit)?;
                } else {
                    if nearest.fraction > 0.0 {
                        total += self
                            .length(&two_point_line(segment.start, nearest.coord), unit)?;
                    }
                    return Ok(Some(clamp_tiny(total)));
                }
            }
            break;
        }
        Ok(Some(clamp_tiny(total)))
    }
}

fn two_point_line(a: Coord<f64>, b: Coord<f64>) -> LineString<f64> {
    LineString::from(vec![a, b])
}

fn unproject_web_mercator(c: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (c.x / WEB_MERCATOR_RADIUS).to_degrees(),
        y: (c.y / WEB_MERCATOR_RADIUS).sinh().atan().to_degrees(),
    }
}

pub(crate) fn clamp_tiny(length: f64) -> f64 {
    if length.abs() < LENGTH_EPSILON {
        0.0
    } else {
        length
    }
}

struct NearestOnPath {
    part: usize,
    segment: usize,
    fraction: f64,
    coord: Coord<f64>,
}

/// Nearest coordinate on any segment of `path`, by coordinate-space
/// projection (matching the map engine's nearest-coordinate
/// semantics).
fn nearest_on_path(path: &PathGeometry, point: Point<f64>) -> Option<NearestOnPath> {
    let mut best: Option<(f64, NearestOnPath)> = None;
    for (part_index, part) in path.paths.iter().enumerate() {
        for (segment_index, segment) in part.lines().enumerate() {
            let (coord, fraction) = project_onto_segment(segment, point);
            let dx = coord.x - point.x();
            let dy = coord.y - point.y();
            let dist2 = dx * dx + dy * dy;
            if best.as_ref().map_or(true, |(d, _)| dist2 < *d) {
                best = Some((
                    dist2,
                    NearestOnPath {
                        part: part_index,
                        segment: segment_index,
                        fraction,
                        coord,
                    },
                ));
            }
        }
    }
    best.map(|(_, nearest)| nearest)
}

fn project_onto_segment(segment: Line<f64>, point: Point<f64>) -> (Coord<f64>, f64) {
    let d = segment.delta();
    let len2 = d.x * d.x + d.y * d.y;
    if len2 == 0.0 {
        return (segment.start, 0.0);
    }
    let t = ((point.x() - segment.start.x) * d.x + (point.y() - segment.start.y) * d.y) / len2;
    let t = t.clamp(0.0, 1.0);
    (
        Coord {
            x: segment.start.x + t * d.x,
            y: segment.start.y + t * d.y,
        },
        t,
    )
}

/// Multipart polyline with optional per-vertex z, stored as parallel
/// vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct PathGeometry {
    pub paths: Vec<LineString<f64>>,

    /// Per-vertex z values parallel to `paths`, in the map spatial
    /// reference's vertical unit.
    pub z: Option<Vec<Vec<f64>>>,
}

impl PathGeometry {
    pub fn single(line: LineString<f64>) -> Self {
        Self {
            paths: vec![line],
            z: None,
        }
    }

    pub fn with_z(line: LineString<f64>, z: Vec<f64>) -> Self {
        Self {
            paths: vec![line],
            z: Some(vec![z]),
        }
    }

    /// True when every path carries a matching z vector.
    pub fn has_z(&self) -> bool {
        match &self.z {
            None => false,
            Some(z) => {
                z.len() == self.paths.len()
                    && self
                        .paths
                        .iter()
                        .zip(z)
                        .all(|(path, zs)| path.0.len() == zs.len())
            }
        }
    }

    /// Vertices of path `index` paired with their z values, if z is
    /// present.
    pub(crate) fn vertices(&self, index: usize) -> impl Iterator<Item = PointGeometry> + '_ {
        let z = self
            .z
            .as_ref()
            .and_then(|z| z.get(index))
            .map(|z| z.as_slice());
        self.paths[index]
            .coords()
            .enumerate()
            .map(move |(vertex_index, &coord)| PointGeometry {
                point: Point::from(coord),
                z: z.and_then(|z| z.get(vertex_index).copied()),
            })
    }
}

/// A point with an optional z in the map spatial reference's
/// vertical unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointGeometry {
    pub point: Point<f64>,
    pub z: Option<f64>,
}
