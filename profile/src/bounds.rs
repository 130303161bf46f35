use crate::{
    error::ProfileError,
    sample::{EffectiveUnits, GroundStats, SelectedUnits},
    tracker::LayerExtremes,
};
use serde::Serialize;
use units::nice_scale;

/// Axis window for the chart, in the selected units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Inputs to the axis-bounds calculation.
#[derive(Debug, Clone, Copy)]
pub struct BoundsParams<'a> {
    /// Ground statistics, in the effective units.
    pub stats: GroundStats,
    pub effective: EffectiveUnits,
    pub selected: SelectedUnits,

    /// Per-layer extremes, already in the selected units.
    pub extremes: &'a LayerExtremes,

    pub pixel_width: f64,
    pub pixel_height: f64,

    /// Equalize units-per-pixel across both axes.
    pub uniform_scaling: bool,

    /// Enforce a minimum elevation span proportional to the distance
    /// span, so flat profiles don't render as noise.
    pub dynamic_elevation_range: bool,
}

/// The minimum span of either axis; degenerate windows confuse the
/// chart's tick generation.
const MIN_SPAN: f64 = 0.001;

/// Fraction of the elevation span padded below the ground line.
const PAD: f64 = 0.02;

/// Distance-to-elevation ratio for the dynamic minimum elevation span.
const DYNAMIC_RATIO: f64 = 300.0;

/// Axis bounds covering the ground profile and every injected series,
/// padded and snapped to a readable tick scale.
pub fn adjusted_bounds(params: BoundsParams<'_>) -> Result<AxisBounds, ProfileError> {
    let BoundsParams {
        stats,
        effective,
        selected,
        extremes,
        pixel_width,
        pixel_height,
        uniform_scaling,
        dynamic_elevation_range,
    } = params;

    let max_x = units::convert(stats.max_distance, effective.distance, selected.distance)?;
    let mut min_y = units::convert(stats.min_elevation, effective.elevation, selected.elevation)?;
    let mut max_y = units::convert(stats.max_elevation, effective.elevation, selected.elevation)?;
    for minmax in extremes.values() {
        min_y = min_y.min(minmax.min);
        max_y = max_y.max(minmax.max);
    }

    let range_x = max_x.max(MIN_SPAN);
    let mut range_y = (max_y - min_y).max(MIN_SPAN);
    if dynamic_elevation_range {
        let floor = units::convert(range_x, selected.distance, selected.elevation)? / DYNAMIC_RATIO;
        range_y = range_y.max(floor);
    }

    min_y -= PAD * range_y;
    max_y = min_y + range_y + PAD * range_y;

    let (nice_min, nice_max) = nice_scale(min_y, max_y, 10);
    let nice_range_y = nice_max - nice_min;

    if uniform_scaling && pixel_width > 0.0 && pixel_height > 0.0 {
        return uniform_bounds(
            0.0,
            range_x,
            min_y,
            max_y,
            selected,
            pixel_width,
            pixel_height,
        );
    }

    Ok(AxisBounds {
        min_x: 0.0,
        max_x: range_x,
        min_y,
        max_y: min_y + nice_range_y,
    })
}

/// Widens whichever axis has fewer units per pixel until both match,
/// keeping each axis centered.
fn uniform_bounds(
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
    selected: SelectedUnits,
    pixel_width: f64,
    pixel_height: f64,
) -> Result<AxisBounds, ProfileError> {
    let range_x = max_x - min_x;
    let range_y_as_distance =
        units::convert(max_y - min_y, selected.elevation, selected.distance)?;
    let upp_x = range_x / pixel_width;
    let upp_y = range_y_as_distance / pixel_height;
    let scale = upp_y / upp_x;

    if scale >= 1.0 {
        let (min_x, max_x) = scale_centered(min_x, max_x, scale);
        Ok(AxisBounds {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    } else {
        let (min_y, max_y) = scale_centered(min_y, max_y, 1.0 / scale);
        Ok(AxisBounds {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }
}

fn scale_centered(min: f64, max: f64, factor: f64) -> (f64, f64) {
    let center = (min + max) / 2.0;
    let half = (max - min) * factor / 2.0;
    (center - half, center + half)
}
