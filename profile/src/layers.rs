use crate::{
    config::{Attributes, DistanceRule, ElevationMode, ElevationRule, ProfileLayerConfig},
    error::ProfileError,
    geom::{MapProjection, PathGeometry},
    math::span_value,
    point::{ElevationPoint, LayerId, SeriesKey},
    sample::SelectedUnits,
    tracker::SeriesTracker,
};
use geo::geometry::LineString;
use units::LinearUnit;

/// One feature of the drawn path, in selection order. The path is the
/// concatenation of every selected feature; features contribute to a
/// profile series only when their layer matches the series config.
#[derive(Debug, Clone)]
pub struct SelectedFeature {
    pub layer_id: LayerId,
    pub geometry: PathGeometry,
    pub attributes: Attributes,
}

/// Injects one profile series per configured layer into the table.
///
/// Walks the selected features in order, accumulating each feature's
/// length to place it along the x axis, and writes the layer's
/// elevation value into every row the feature covers.
pub fn inject_profile_layers(
    points: &mut [ElevationPoint],
    tracker: &mut SeriesTracker,
    features: &[SelectedFeature],
    configs: &[ProfileLayerConfig],
    projection: MapProjection,
    selected: SelectedUnits,
) -> Result<(), ProfileError> {
    for config in configs {
        let mut start = 0.0;
        for feature in features {
            let length = feature_length(feature, &config.distance, projection, selected.distance)?;
            if feature.layer_id == config.layer_id {
                inject_feature(points, tracker, config, feature, start, length, projection, selected)?;
            }
            start += length;
        }
    }
    Ok(())
}

/// Length the feature occupies along the path, in the selected
/// distance unit.
fn feature_length(
    feature: &SelectedFeature,
    rule: &DistanceRule,
    projection: MapProjection,
    unit: LinearUnit,
) -> Result<f64, ProfileError> {
    match rule {
        DistanceRule::Map => {
            let mut total = 0.0;
            for path in &feature.geometry.paths {
                total += projection.length(path, unit)?;
            }
            Ok(total)
        }
        DistanceRule::Field { field, unit: from } => {
            match feature.attributes.get(field).copied().flatten() {
                Some(value) => Ok(units::convert(value, *from, unit)?),
                None => Ok(0.0),
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn inject_feature(
    points: &mut [ElevationPoint],
    tracker: &mut SeriesTracker,
    config: &ProfileLayerConfig,
    feature: &SelectedFeature,
    start: f64,
    length: f64,
    projection: MapProjection,
    selected: SelectedUnits,
) -> Result<(), ProfileError> {
    let end = start + length;
    let covered: Vec<usize> = points
        .iter()
        .enumerate()
        .filter(|(_, point)| point.x >= start && point.x <= end)
        .map(|(index, _)| index)
        .collect();
    if covered.is_empty() {
        return Ok(());
    }

    // The elevation mode applies to geometry z values only; field
    // rules carry their own vertical datum.
    match &config.elevation {
        ElevationRule::OneField { field1, unit } => {
            let field = feature.attributes.get(field1).copied().flatten();
            let constant = match field {
                Some(raw) => Some(units::convert(raw, *unit, selected.elevation)?),
                None => None,
            };
            for &index in &covered {
                let value = constant.unwrap_or(points[index].y);
                record(points, tracker, index, &config.layer_id, value);
            }
        }
        ElevationRule::TwoField {
            field1,
            field2,
            unit,
        } => {
            let first = feature.attributes.get(field1).copied().flatten();
            let second = feature.attributes.get(field2).copied().flatten();
            match (first, second) {
                (Some(first), Some(second)) => {
                    let first = units::convert(first, *unit, selected.elevation)?;
                    let second = units::convert(second, *unit, selected.elevation)?;
                    for &index in &covered {
                        let value = span_value(start, length, first, second, points[index].x);
                        record(points, tracker, index, &config.layer_id, value);
                    }
                }
                // Either field missing or null: the feature sits on
                // the ground.
                _ => {
                    for &index in &covered {
                        let value = points[index].y;
                        record(points, tracker, index, &config.layer_id, value);
                    }
                }
            }
        }
        ElevationRule::Z => {
            inject_z(points, tracker, config, feature, &covered, projection, selected)?;
        }
        ElevationRule::MatchProfile | ElevationRule::None => {
            for &index in &covered {
                let value = points[index].y;
                record(points, tracker, index, &config.layer_id, value);
            }
        }
    }
    Ok(())
}

/// Per-vertex z injection. Walks the feature's vertex segments in
/// order, anchored at the first covered row's x, and interpolates z
/// between segment endpoints for each row the segment covers.
fn inject_z(
    points: &mut [ElevationPoint],
    tracker: &mut SeriesTracker,
    config: &ProfileLayerConfig,
    feature: &SelectedFeature,
    covered: &[usize],
    projection: MapProjection,
    selected: SelectedUnits,
) -> Result<(), ProfileError> {
    let ground_only = !feature.geometry.has_z()
        || config.elevation_mode == ElevationMode::OnTheGround;
    if ground_only {
        for &index in covered {
            let value = points[index].y;
            record(points, tracker, index, &config.layer_id, value);
        }
        return Ok(());
    }

    let relative = matches!(
        config.elevation_mode,
        ElevationMode::RelativeToGround | ElevationMode::RelativeToScene
    );
    let meters_per_z = projection.meters_per_vertical_unit();
    let key = SeriesKey::Profile {
        layer: config.layer_id.clone(),
    };

    let mut cursor = points[covered[0]].x;
    let mut next = 0;
    for path_index in 0..feature.geometry.paths.len() {
        let vertices: Vec<_> = feature.geometry.vertices(path_index).collect();
        for pair in vertices.windows(2) {
            let segment = LineString::from(vec![pair[0].point.0, pair[1].point.0]);
            let segment_length = projection.length(&segment, selected.distance)?;
            let segment_end = cursor + segment_length;

            let mut in_segment = Vec::new();
            while next < covered.len() && points[covered[next]].x <= segment_end {
                in_segment.push(covered[next]);
                next += 1;
            }
            if !in_segment.is_empty() {
                let mut z_start = units::convert(
                    pair[0].z.unwrap_or(0.0) * meters_per_z,
                    LinearUnit::Meters,
                    selected.elevation,
                )?;
                let mut z_end = units::convert(
                    pair[1].z.unwrap_or(0.0) * meters_per_z,
                    LinearUnit::Meters,
                    selected.elevation,
                )?;
                if relative {
                    z_start += points[in_segment[0]].y;
                    z_end += points[*in_segment.last().unwrap_or(&in_segment[0])].y;
                }
                for &index in &in_segment {
                    if points[index].series.contains_key(&key) {
                        continue;
                    }
                    let value =
                        span_value(cursor, segment_length, z_start, z_end, points[index].x);
                    record(points, tracker, index, &config.layer_id, value);
                }
            }
            cursor = segment_end;
        }
    }
    Ok(())
}

fn record(
    points: &mut [ElevationPoint],
    tracker: &mut SeriesTracker,
    index: usize,
    layer: &str,
    value: f64,
) {
    let point = &mut points[index];
    point.series.insert(
        SeriesKey::Profile {
            layer: layer.to_string(),
        },
        value,
    );
    point.profile_layer = Some(layer.to_string());
    tracker.record_profile(point.point_index, layer, value);
}

#[cfg(test)]
mod tests {
    use super::{inject_profile_layers, SelectedFeature};
    use crate::{
        config::{
            Attributes, DistanceRule, ElevationMode, ElevationRule, ProfileLayerConfig,
        },
        geom::{MapProjection, PathGeometry},
        point::{ElevationPoint, SeriesKey},
        sample::{build_base_table, EffectiveUnits, GroundSample, SelectedUnits},
        tracker::SeriesTracker,
    };
    use assert_approx_eq::assert_approx_eq;
    use geo::line_string;
    use units::LinearUnit;

    fn meters() -> SelectedUnits {
        SelectedUnits {
            distance: LinearUnit::Meters,
            elevation: LinearUnit::Meters,
        }
    }

    fn planar() -> MapProjection {
        MapProjection::Planar {
            meters_per_unit: 1.0,
        }
    }

    /// Rows at x = 0, 10, .., 100, ground at y = 0.
    fn table() -> Vec<ElevationPoint> {
        let samples: Vec<GroundSample> = (0..=10)
            .map(|i| GroundSample {
                map_x: 10.0 * i as f64,
                map_y: 0.0,
                distance: 10.0 * i as f64,
                elevation: 0.0,
            })
            .collect();
        let effective = EffectiveUnits {
            distance: LinearUnit::Meters,
            elevation: LinearUnit::Meters,
        };
        build_base_table(&samples, None, effective, meters()).unwrap()
    }

    fn feature(layer: &str, length: f64, attributes: Attributes) -> SelectedFeature {
        SelectedFeature {
            layer_id: layer.to_string(),
            geometry: PathGeometry::single(line_string![
                (x: 0.0, y: 0.0),
                (x: length, y: 0.0),
            ]),
            attributes,
        }
    }

    fn config(layer: &str, elevation: ElevationRule) -> ProfileLayerConfig {
        ProfileLayerConfig {
            layer_id: layer.to_string(),
            elevation,
            distance: DistanceRule::Map,
            elevation_mode: ElevationMode::Absolute,
        }
    }

    fn key(layer: &str) -> SeriesKey {
        SeriesKey::Profile {
            layer: layer.to_string(),
        }
    }

    #[test]
    fn one_field_is_constant_over_covered_rows() {
        let mut points = table();
        let mut tracker = SeriesTracker::new(points.len());
        let mut attributes = Attributes::new();
        attributes.insert("ELEV".to_string(), Some(10.0));
        let configs = vec![config(
            "mains",
            ElevationRule::OneField {
                field1: "ELEV".to_string(),
                unit: LinearUnit::Meters,
            },
        )];
        let selected = vec![feature("mains", 100.0, attributes)];
        inject_profile_layers(
            &mut points,
            &mut tracker,
            &selected,
            &configs,
            planar(),
            meters(),
        )
        .unwrap();

        for point in &points {
            assert_eq!(point.series_value(&key("mains")), Some(10.0));
            assert_eq!(point.profile_layer.as_deref(), Some("mains"));
        }
        let extremes = &tracker.extremes()["mains"];
        assert_eq!((extremes.min, extremes.max), (10.0, 10.0));
    }

    #[test]
    fn two_field_interpolates_between_endpoints() {
        let mut points = table();
        let mut tracker = SeriesTracker::new(points.len());
        let mut attributes = Attributes::new();
        attributes.insert("UP".to_string(), Some(0.0));
        attributes.insert("DOWN".to_string(), Some(100.0));
        let configs = vec![config(
            "mains",
            ElevationRule::TwoField {
                field1: "UP".to_string(),
                field2: "DOWN".to_string(),
                unit: LinearUnit::Meters,
            },
        )];
        let selected = vec![feature("mains", 100.0, attributes)];
        inject_profile_layers(
            &mut points,
            &mut tracker,
            &selected,
            &configs,
            planar(),
            meters(),
        )
        .unwrap();

        assert_approx_eq!(points[5].series_value(&key("mains")).unwrap(), 50.0);
        assert_approx_eq!(points[10].series_value(&key("mains")).unwrap(), 100.0);
    }

    #[test]
    fn null_field_falls_back_to_ground() {
        let mut points = table();
        let mut tracker = SeriesTracker::new(points.len());
        let mut attributes = Attributes::new();
        attributes.insert("ELEV".to_string(), None);
        let configs = vec![config(
            "mains",
            ElevationRule::OneField {
                field1: "ELEV".to_string(),
                unit: LinearUnit::Meters,
            },
        )];
        let selected = vec![feature("mains", 100.0, attributes)];
        inject_profile_layers(
            &mut points,
            &mut tracker,
            &selected,
            &configs,
            planar(),
            meters(),
        )
        .unwrap();

        for point in &points {
            assert_eq!(point.series_value(&key("mains")), Some(point.y));
        }
    }

    #[test]
    fn later_feature_starts_after_earlier_lengths() {
        let mut points = table();
        let mut tracker = SeriesTracker::new(points.len());
        let mut attributes = Attributes::new();
        attributes.insert("ELEV".to_string(), Some(20.0));
        let configs = vec![config(
            "laterals",
            ElevationRule::OneField {
                field1: "ELEV".to_string(),
                unit: LinearUnit::Meters,
            },
        )];
        // A 60 m feature from another layer precedes the 40 m lateral.
        let selected = vec![
            feature("mains", 60.0, Attributes::new()),
            feature("laterals", 40.0, attributes),
        ];
        inject_profile_layers(
            &mut points,
            &mut tracker,
            &selected,
            &configs,
            planar(),
            meters(),
        )
        .unwrap();

        assert_eq!(points[5].series_value(&key("laterals")), None);
        assert_eq!(points[6].series_value(&key("laterals")), Some(20.0));
        assert_eq!(points[10].series_value(&key("laterals")), Some(20.0));
    }

    #[test]
    fn distance_field_overrides_map_length() {
        let mut points = table();
        let mut tracker = SeriesTracker::new(points.len());
        let mut attributes = Attributes::new();
        attributes.insert("LEN".to_string(), Some(30.0));
        attributes.insert("ELEV".to_string(), Some(5.0));
        let mut cfg = config(
            "mains",
            ElevationRule::OneField {
                field1: "ELEV".to_string(),
                unit: LinearUnit::Meters,
            },
        );
        cfg.distance = DistanceRule::Field {
            field: "LEN".to_string(),
            unit: LinearUnit::Meters,
        };
        // Geometry says 100 m; the field says 30 m and wins.
        let selected = vec![feature("mains", 100.0, attributes)];
        inject_profile_layers(
            &mut points,
            &mut tracker,
            &selected,
            &vec![cfg],
            planar(),
            meters(),
        )
        .unwrap();

        assert_eq!(points[3].series_value(&key("mains")), Some(5.0));
        assert_eq!(points[4].series_value(&key("mains")), None);
    }

    #[test]
    fn z_rule_interpolates_vertex_elevations() {
        let mut points = table();
        let mut tracker = SeriesTracker::new(points.len());
        let configs = vec![config("mains", ElevationRule::Z)];
        let selected = vec![SelectedFeature {
            layer_id: "mains".to_string(),
            geometry: PathGeometry::with_z(
                line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
                vec![0.0, 50.0],
            ),
            attributes: Attributes::new(),
        }];
        inject_profile_layers(
            &mut points,
            &mut tracker,
            &selected,
            &configs,
            planar(),
            meters(),
        )
        .unwrap();

        assert_approx_eq!(points[0].series_value(&key("mains")).unwrap(), 0.0);
        assert_approx_eq!(points[5].series_value(&key("mains")).unwrap(), 25.0);
        assert_approx_eq!(points[10].series_value(&key("mains")).unwrap(), 50.0);
    }

    #[test]
    fn z_scales_by_spatial_reference_unit() {
        let mut points = table();
        let mut tracker = SeriesTracker::new(points.len());
        let configs = vec![config("mains", ElevationRule::Z)];
        let selected = vec![SelectedFeature {
            layer_id: "mains".to_string(),
            geometry: PathGeometry::with_z(
                line_string![(x: 0.0, y: 0.0), (x: 328.084, y: 0.0)],
                vec![10.0, 10.0],
            ),
            attributes: Attributes::new(),
        }];
        // Feet-based spatial reference: z of 10 SR units is 3.048 m.
        let feet_sr = MapProjection::Planar {
            meters_per_unit: 0.3048,
        };
        inject_profile_layers(
            &mut points,
            &mut tracker,
            &selected,
            &configs,
            feet_sr,
            meters(),
        )
        .unwrap();

        assert_approx_eq!(points[0].series_value(&key("mains")).unwrap(), 3.048);
    }

    #[test]
    fn z_without_z_values_falls_back_to_ground() {
        let mut points = table();
        let mut tracker = SeriesTracker::new(points.len());
        let configs = vec![config("mains", ElevationRule::Z)];
        let selected = vec![feature("mains", 100.0, Attributes::new())];
        inject_profile_layers(
            &mut points,
            &mut tracker,
            &selected,
            &configs,
            planar(),
            meters(),
        )
        .unwrap();

        for point in &points {
            assert_eq!(point.series_value(&key("mains")), Some(point.y));
        }
    }

    #[test]
    fn on_the_ground_flattens_z_geometry() {
        let mut points = table();
        let mut tracker = SeriesTracker::new(points.len());
        let mut cfg = config("mains", ElevationRule::Z);
        cfg.elevation_mode = ElevationMode::OnTheGround;
        let selected = vec![SelectedFeature {
            layer_id: "mains".to_string(),
            geometry: PathGeometry::with_z(
                line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
                vec![40.0, 40.0],
            ),
            attributes: Attributes::new(),
        }];
        inject_profile_layers(
            &mut points,
            &mut tracker,
            &selected,
            &vec![cfg],
            planar(),
            meters(),
        )
        .unwrap();

        for point in &points {
            assert_eq!(point.series_value(&key("mains")), Some(point.y));
        }
    }

    #[test]
    fn elevation_mode_leaves_field_rules_alone() {
        let mut points = table();
        let mut tracker = SeriesTracker::new(points.len());
        let mut attributes = Attributes::new();
        attributes.insert("ELEV".to_string(), Some(10.0));
        let mut cfg = config(
            "mains",
            ElevationRule::OneField {
                field1: "ELEV".to_string(),
                unit: LinearUnit::Meters,
            },
        );
        cfg.elevation_mode = ElevationMode::OnTheGround;
        let selected = vec![feature("mains", 100.0, attributes)];
        inject_profile_layers(
            &mut points,
            &mut tracker,
            &selected,
            &vec![cfg],
            planar(),
            meters(),
        )
        .unwrap();

        // Field values carry their own vertical datum; the mode only
        // applies to geometry z.
        for point in &points {
            assert_eq!(point.series_value(&key("mains")), Some(10.0));
        }
    }
}
