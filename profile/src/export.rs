use crate::{
    geom::clamp_tiny,
    point::{ElevationPoint, SeriesKey},
    tracker::IntersectionIndex,
};
use serde::Serialize;

/// Mirrors the table's x values so the profile reads from the path's
/// far end. Rows stay in place; only x changes, so `point_index` and
/// every side-table keyed by it remain valid. Applying twice restores
/// the original orientation.
pub fn flip(points: &mut [ElevationPoint]) {
    let total = points.iter().fold(0.0_f64, |acc, point| acc.max(point.x));
    for point in points.iter_mut() {
        point.x = total - point.x;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Minimum x spacing between exported rows. `None` exports every
    /// row.
    pub custom_interval: Option<f64>,

    /// Table is currently flipped; the filtered rows are reversed at
    /// the end so the export still reads in ascending x.
    pub flipped: bool,
}

/// Rows selected for export: spaced by the custom interval, with
/// consecutive duplicate stations collapsed to their first row.
///
/// The interval filter walks rows in stored order. On a flipped table
/// the stored x values descend, so the filter keeps rows from the
/// path's far end; the reversal happens last.
pub fn export_rows<'a>(
    points: &'a [ElevationPoint],
    options: ExportOptions,
) -> Vec<&'a ElevationPoint> {
    let mut rows: Vec<&ElevationPoint> = Vec::new();
    let mut threshold = 0.0;
    for point in points {
        if let Some(interval) = options.custom_interval {
            if point.x < threshold {
                continue;
            }
            threshold += interval;
        }
        if rows.last().map_or(false, |prev| prev.x == point.x) {
            continue;
        }
        rows.push(point);
    }
    if options.flipped {
        rows.reverse();
    }
    rows
}

/// One exported intersection, joined back to its table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntersectionExportRow {
    pub series: SeriesKey,
    pub x: f64,
    pub value: f64,
    pub value2: Option<f64>,
    pub display_value: Option<String>,
    pub map_x: f64,
    pub map_y: f64,
}

/// Exported intersections for one layer, in ascending table order, or
/// descending when the table is flipped.
pub fn intersection_export_rows(
    points: &[ElevationPoint],
    intersections: &IntersectionIndex,
    layer: &str,
    flipped: bool,
) -> Vec<IntersectionExportRow> {
    let mut rows = Vec::new();
    for (&point_index, layers) in intersections {
        let Some(entries) = layers.get(layer) else {
            continue;
        };
        let Some(point) = points.get(point_index) else {
            continue;
        };
        for entry in entries {
            rows.push(IntersectionExportRow {
                series: entry.key.clone(),
                x: clamp_tiny(point.x),
                value: clamp_tiny(entry.value),
                value2: entry.value2.map(clamp_tiny),
                display_value: entry.display_value.clone(),
                map_x: point.map_x,
                map_y: point.map_y,
            });
        }
    }
    if flipped {
        rows.reverse();
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::{export_rows, flip, intersection_export_rows, ExportOptions};
    use crate::{
        config::MarkerStyle,
        point::{ElevationPoint, SeriesKey},
        tracker::{IntersectionEntry, SeriesTracker},
    };
    use assert_approx_eq::assert_approx_eq;
    use std::collections::BTreeMap;

    fn row(x: f64, point_index: usize) -> ElevationPoint {
        ElevationPoint {
            x,
            y: 0.0,
            view_y: None,
            map_x: x,
            map_y: 0.0,
            point_index,
            profile_layer: None,
            series: BTreeMap::new(),
        }
    }

    fn table(xs: &[f64]) -> Vec<ElevationPoint> {
        xs.iter().enumerate().map(|(i, &x)| row(x, i)).collect()
    }

    #[test]
    fn flip_mirrors_x_and_is_an_involution() {
        let mut points = table(&[0.0, 10.0, 25.0, 50.0]);
        let original: Vec<f64> = points.iter().map(|p| p.x).collect();
        flip(&mut points);
        assert_approx_eq!(points[0].x, 50.0);
        assert_approx_eq!(points[2].x, 25.0);
        assert_approx_eq!(points[3].x, 0.0);
        // Indices stay put.
        assert_eq!(points[3].point_index, 3);
        flip(&mut points);
        for (point, &x) in points.iter().zip(&original) {
            assert_approx_eq!(point.x, x);
        }
    }

    #[test]
    fn interval_filter_spaces_rows() {
        let points = table(&[0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
        let rows = export_rows(
            &points,
            ExportOptions {
                custom_interval: Some(25.0),
                flipped: false,
            },
        );
        let xs: Vec<f64> = rows.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 30.0, 50.0]);
    }

    #[test]
    fn no_interval_exports_every_distinct_row() {
        let points = table(&[0.0, 10.0, 20.0]);
        let rows = export_rows(&points, ExportOptions::default());
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn duplicate_stations_collapse_to_first() {
        let points = table(&[0.0, 10.0, 10.0, 20.0]);
        let rows = export_rows(&points, ExportOptions::default());
        let indices: Vec<usize> = rows.iter().map(|p| p.point_index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
    }

    #[test]
    fn flipped_export_reads_in_ascending_x() {
        let mut points = table(&[0.0, 10.0, 20.0, 30.0]);
        flip(&mut points);
        let rows = export_rows(
            &points,
            ExportOptions {
                custom_interval: None,
                flipped: true,
            },
        );
        let xs: Vec<f64> = rows.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn flipped_interval_keeps_far_end_rows() {
        let mut points = table(&[0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]);
        flip(&mut points);
        // Stored order descends from 100; the filter keeps 100, 90,
        // 80 before the threshold passes the remaining rows, then the
        // result reverses into ascending order.
        let rows = export_rows(
            &points,
            ExportOptions {
                custom_interval: Some(25.0),
                flipped: true,
            },
        );
        let xs: Vec<f64> = rows.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![80.0, 90.0, 100.0]);
    }

    #[test]
    fn intersection_rows_clamp_scientific_noise() {
        let points = table(&[0.0, 3.0e-7, 20.0]);
        let mut tracker = SeriesTracker::new(points.len());
        tracker.record_intersection(
            1,
            "assets",
            IntersectionEntry {
                key: SeriesKey::Point {
                    layer: "assets".to_string(),
                    feature: 0,
                },
                value: -4.0e-8,
                value2: None,
                display_value: Some("Valve 3".to_string()),
                marker: MarkerStyle::default(),
                feature: 0,
            },
        );
        let parts = tracker.into_parts();
        let rows = intersection_export_rows(&points, &parts.intersections, "assets", false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].x, 0.0);
        assert_eq!(rows[0].value, 0.0);
        assert_eq!(rows[0].display_value.as_deref(), Some("Valve 3"));
    }

    #[test]
    fn flipped_intersection_rows_reverse() {
        let points = table(&[0.0, 10.0, 20.0]);
        let mut tracker = SeriesTracker::new(points.len());
        for index in [0usize, 2] {
            tracker.record_intersection(
                index,
                "assets",
                IntersectionEntry {
                    key: SeriesKey::Point {
                        layer: "assets".to_string(),
                        feature: index,
                    },
                    value: index as f64,
                    value2: None,
                    display_value: None,
                    marker: MarkerStyle::default(),
                    feature: index,
                },
            );
        }
        let parts = tracker.into_parts();
        let rows = intersection_export_rows(&points, &parts.intersections, "assets", true);
        assert_eq!(rows[0].value, 2.0);
        assert_eq!(rows[1].value, 0.0);
    }
}
