use crate::{
    config::{AssetLayerConfig, Attributes, ElevationRule},
    error::ProfileError,
    geom::{MapProjection, PathGeometry, PointGeometry},
    math::span_value,
    point::{ElevationPoint, SeriesKey},
    sample::SelectedUnits,
    tracker::{IntersectionEntry, SeriesTracker},
};
use units::LinearUnit;

/// Geometry of one intersecting asset feature.
#[derive(Debug, Clone)]
pub enum AssetGeometry {
    Point(PointGeometry),
    Line(PathGeometry),
}

/// One asset feature returned by an intersection query against the
/// drawn path.
#[derive(Debug, Clone)]
pub struct IntersectionHit {
    /// The feature's full geometry, used for along-feature
    /// interpolation.
    pub geometry: AssetGeometry,

    pub attributes: Attributes,

    /// Pre-formatted label for the layer's display field, if any.
    pub display_value: Option<String>,

    /// Sub-paths of a line feature that overlap the drawn path.
    pub connected: Vec<PathGeometry>,

    /// Isolated points where a line feature crosses the drawn path.
    pub disconnected: Vec<PointGeometry>,
}

/// Query result for one asset layer.
#[derive(Debug, Clone)]
pub struct LayerIntersections {
    pub config: AssetLayerConfig,
    pub hits: Vec<IntersectionHit>,
}

/// Injects one asset layer's intersections into the table. Point
/// features mark a single row; line features mark a row span per
/// overlapping sub-path, collapsing to a point marker when the span
/// covers too few rows to draw as a line.
pub fn inject_intersections(
    points: &mut [ElevationPoint],
    tracker: &mut SeriesTracker,
    layer: &LayerIntersections,
    path: &PathGeometry,
    projection: MapProjection,
    selected: SelectedUnits,
) -> Result<(), ProfileError> {
    if points.is_empty() {
        return Ok(());
    }
    for (feature, hit) in layer.hits.iter().enumerate() {
        match &hit.geometry {
            AssetGeometry::Point(point) => {
                inject_point(points, tracker, layer, feature, hit, *point, path, projection, selected)?;
            }
            AssetGeometry::Line(_) => {
                inject_line(points, tracker, layer, feature, hit, path, projection, selected)?;
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn inject_point(
    points: &mut [ElevationPoint],
    tracker: &mut SeriesTracker,
    layer: &LayerIntersections,
    feature: usize,
    hit: &IntersectionHit,
    geometry: PointGeometry,
    path: &PathGeometry,
    projection: MapProjection,
    selected: SelectedUnits,
) -> Result<(), ProfileError> {
    let Some(distance) = projection.distance_along(path, geometry.point, selected.distance)? else {
        return Ok(());
    };
    let Some(index) = row_at_or_after(points, distance) else {
        return Ok(());
    };

    let rule = &layer.config.elevation;
    let layer_id = &layer.config.layer_id;
    let (elevation, second) = match rule {
        ElevationRule::Z => (
            convert_z(geometry.z, projection, selected.elevation)?,
            None,
        ),
        ElevationRule::OneField { field1, unit } => (
            convert_attr(&hit.attributes, field1, *unit, selected.elevation)?,
            None,
        ),
        ElevationRule::TwoField {
            field1,
            field2,
            unit,
        } => (
            convert_attr(&hit.attributes, field1, *unit, selected.elevation)?,
            convert_attr(&hit.attributes, field2, *unit, selected.elevation)?,
        ),
        ElevationRule::MatchProfile | ElevationRule::None => (None, None),
    };

    let value = elevation.unwrap_or_else(|| fallback_value(&points[index], rule));
    let key = SeriesKey::Point {
        layer: layer_id.clone(),
        feature,
    };
    points[index].series.insert(key.clone(), value);

    let value2 = match rule {
        ElevationRule::TwoField { .. } => {
            let value2 = second.unwrap_or(points[index].y);
            points[index].series.insert(
                SeriesKey::Point2 {
                    layer: layer_id.clone(),
                    feature,
                },
                value2,
            );
            Some(value2)
        }
        _ => None,
    };

    let point_index = points[index].point_index;
    tracker.record_intersection(
        point_index,
        layer_id,
        IntersectionEntry {
            key,
            value,
            value2,
            display_value: hit.display_value.clone(),
            marker: layer.config.style.clone(),
            feature,
        },
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn inject_line(
    points: &mut [ElevationPoint],
    tracker: &mut SeriesTracker,
    layer: &LayerIntersections,
    feature: usize,
    hit: &IntersectionHit,
    path: &PathGeometry,
    projection: MapProjection,
    selected: SelectedUnits,
) -> Result<(), ProfileError> {
    let rule = &layer.config.elevation;
    let layer_id = &layer.config.layer_id;
    let last = points.len() - 1;

    let mut path_index = 0;
    for connected in &hit.connected {
        for part in 0..connected.paths.len() {
            // Rows covered by this sub-path, with the value computed
            // from the oriented span they fall on.
            let mut covered: Vec<(usize, f64)> = Vec::new();
            let mut beyond_table = false;

            let vertices: Vec<PointGeometry> = connected.vertices(part).collect();
            let mut stations = Vec::with_capacity(vertices.len());
            for vertex in &vertices {
                let distance = projection.distance_along(path, vertex.point, selected.distance)?;
                let elevation =
                    feature_elevation(vertex, hit, rule, projection, selected)?;
                stations.push((distance, elevation));
            }

            for pair in stations.windows(2) {
                let (Some(d0), e0) = pair[0] else { continue };
                let (Some(d1), e1) = pair[1] else { continue };
                // Orient by path direction: sub-paths may run against
                // the drawn path, so the smaller station leads and its
                // elevation comes with it.
                let (start, end, e_start, e_end) = if d1 < d0 {
                    (d1, d0, e1, e0)
                } else {
                    (d0, d1, e0, e1)
                };

                let rows: Vec<usize> = points
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.x >= start && p.x < end)
                    .map(|(i, _)| i)
                    .collect();

                if rows.is_empty() {
                    // The span falls between rows; pin it to the row
                    // just before its end so the feature still shows.
                    let pinned = if start == 0.0 {
                        Some(0)
                    } else {
                        points.iter().rposition(|p| p.x < end)
                    };
                    match pinned {
                        Some(index) => {
                            push_covered(&mut covered, points, index, start, end, e_start, e_end, rule);
                        }
                        None if points[last].x < end => beyond_table = true,
                        None => {}
                    }
                    continue;
                }
                for index in rows {
                    push_covered(&mut covered, points, index, start, end, e_start, e_end, rule);
                }
            }

            if covered.len() > layer.config.segment_point_threshold {
                let key = SeriesKey::Segment {
                    layer: layer_id.clone(),
                    feature,
                    path: path_index,
                };
                for &(index, value) in &covered {
                    points[index].series.insert(key.clone(), value);
                    let point_index = points[index].point_index;
                    tracker.record_intersection(
                        point_index,
                        layer_id,
                        IntersectionEntry {
                            key: key.clone(),
                            value,
                            value2: None,
                            display_value: hit.display_value.clone(),
                            marker: layer.config.style.clone(),
                            feature,
                        },
                    );
                }
            } else if let Some(&(index, value)) = covered.first() {
                record_segment_point(
                    points, tracker, layer, feature, path_index, index, value, hit,
                );
            } else if beyond_table {
                let value = fallback_value(&points[last], rule);
                record_segment_point(
                    points, tracker, layer, feature, path_index, last, value, hit,
                );
            }
            path_index += 1;
        }
    }

    for (point, geometry) in hit.disconnected.iter().enumerate() {
        let Some(distance) = projection.distance_along(path, geometry.point, selected.distance)?
        else {
            continue;
        };
        let elevation = feature_elevation(geometry, hit, rule, projection, selected)?;
        let Some(index) = row_at_or_after(points, distance) else {
            continue;
        };
        let key = SeriesKey::Detached {
            layer: layer_id.clone(),
            feature,
            point,
        };
        if points[index].series.contains_key(&key) {
            continue;
        }
        let value = elevation.unwrap_or_else(|| fallback_value(&points[index], rule));
        points[index].series.insert(key.clone(), value);
        let point_index = points[index].point_index;
        tracker.record_intersection(
            point_index,
            layer_id,
            IntersectionEntry {
                key,
                value,
                value2: None,
                display_value: hit.display_value.clone(),
                marker: layer.config.style.clone(),
                feature,
            },
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn push_covered(
    covered: &mut Vec<(usize, f64)>,
    points: &[ElevationPoint],
    index: usize,
    start: f64,
    end: f64,
    e_start: Option<f64>,
    e_end: Option<f64>,
    rule: &ElevationRule,
) {
    // Consecutive spans share boundary rows; keep the first value.
    if covered.iter().any(|&(i, _)| i == index) {
        return;
    }
    let value = match (e_start, e_end) {
        (Some(e0), Some(e1)) => span_value(start, end - start, e0, e1, points[index].x),
        _ => fallback_value(&points[index], rule),
    };
    covered.push((index, value));
}

#[allow(clippy::too_many_arguments)]
fn record_segment_point(
    points: &mut [ElevationPoint],
    tracker: &mut SeriesTracker,
    layer: &LayerIntersections,
    feature: usize,
    path: usize,
    index: usize,
    value: f64,
    hit: &IntersectionHit,
) {
    let key = SeriesKey::SegmentPoint {
        layer: layer.config.layer_id.clone(),
        feature,
        path,
    };
    points[index].series.insert(key.clone(), value);
    let point_index = points[index].point_index;
    tracker.record_intersection(
        point_index,
        &layer.config.layer_id,
        IntersectionEntry {
            key,
            value,
            value2: None,
            display_value: hit.display_value.clone(),
            marker: layer.config.style.clone(),
            feature,
        },
    );
}

/// Elevation of one vertex of an asset feature, in the selected
/// elevation unit. `None` means the rule produced no value and the
/// caller falls back to the profile or ground.
fn feature_elevation(
    vertex: &PointGeometry,
    hit: &IntersectionHit,
    rule: &ElevationRule,
    projection: MapProjection,
    selected: SelectedUnits,
) -> Result<Option<f64>, ProfileError> {
    match rule {
        ElevationRule::Z => convert_z(vertex.z, projection, selected.elevation),
        ElevationRule::OneField { field1, unit } => {
            convert_attr(&hit.attributes, field1, *unit, selected.elevation)
        }
        ElevationRule::TwoField {
            field1,
            field2,
            unit,
        } => {
            let first = convert_attr(&hit.attributes, field1, *unit, selected.elevation)?;
            let second = convert_attr(&hit.attributes, field2, *unit, selected.elevation)?;
            let (Some(first), Some(second)) = (first, second) else {
                return Ok(None);
            };
            // Interpolate along the feature's own geometry, not along
            // the drawn path.
            let AssetGeometry::Line(geometry) = &hit.geometry else {
                return Ok(Some(first));
            };
            let mut length = 0.0;
            for path in &geometry.paths {
                length += projection.length(path, selected.distance)?;
            }
            if length == 0.0 {
                return Ok(Some(first));
            }
            let Some(station) =
                projection.distance_along(geometry, vertex.point, selected.distance)?
            else {
                return Ok(Some(first));
            };
            Ok(Some(first + (second - first) * (station / length)))
        }
        ElevationRule::MatchProfile | ElevationRule::None => Ok(None),
    }
}

/// Row the asset lands on: the first row at or past its station,
/// clamped to the last row when it falls beyond the table.
fn row_at_or_after(points: &[ElevationPoint], distance: f64) -> Option<usize> {
    if points.is_empty() {
        return None;
    }
    Some(
        points
            .iter()
            .position(|p| p.x >= distance)
            .unwrap_or(points.len() - 1),
    )
}

fn fallback_value(point: &ElevationPoint, rule: &ElevationRule) -> f64 {
    match rule {
        ElevationRule::MatchProfile => point.profile_value().unwrap_or(point.y),
        _ => point.y,
    }
}

fn convert_z(
    z: Option<f64>,
    projection: MapProjection,
    unit: LinearUnit,
) -> Result<Option<f64>, ProfileError> {
    match z {
        Some(z) => Ok(Some(units::convert(
            z * projection.meters_per_vertical_unit(),
            LinearUnit::Meters,
            unit,
        )?)),
        None => Ok(None),
    }
}

fn convert_attr(
    attributes: &Attributes,
    field: &str,
    from: LinearUnit,
    to: LinearUnit,
) -> Result<Option<f64>, ProfileError> {
    match attributes.get(field).copied().flatten() {
        Some(value) => Ok(Some(units::convert(value, from, to)?)),
        None => Ok(None),
    }
}
