use crate::{error::ProfileError, point::ElevationPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use units::LinearUnit;

/// One raw ground sample along the path, as produced by the
/// elevation sampling service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundSample {
    /// Map-space position of the sample.
    pub map_x: f64,
    pub map_y: f64,

    /// Distance from path start, in the effective linear unit.
    pub distance: f64,

    /// Ground elevation, in the effective elevation unit.
    pub elevation: f64,
}

/// Units the sampling service produced its values in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveUnits {
    pub distance: LinearUnit,
    pub elevation: LinearUnit,
}

/// Units the user selected for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedUnits {
    pub distance: LinearUnit,
    pub elevation: LinearUnit,
}

/// Ground statistics in effective units, as reported by the sampling
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundStats {
    pub min_distance: f64,
    pub max_distance: f64,
    pub min_elevation: f64,
    pub max_elevation: f64,
}

impl GroundStats {
    pub fn from_samples(samples: &[GroundSample]) -> Option<Self> {
        let first = samples.first()?;
        let mut stats = Self {
            min_distance: first.distance,
            max_distance: first.distance,
            min_elevation: first.elevation,
            max_elevation: first.elevation,
        };
        for sample in &samples[1..] {
            stats.min_distance = stats.min_distance.min(sample.distance);
            stats.max_distance = stats.max_distance.max(sample.distance);
            stats.min_elevation = stats.min_elevation.min(sample.elevation);
            stats.max_elevation = stats.max_elevation.max(sample.elevation);
        }
        Some(stats)
    }
}

/// Builds the base table: converts each sample to the selected units
/// and assigns sequential point indices.
///
/// `view_elevations`, when present, must be sampled at the same
/// indices as `ground`; a length mismatch is fatal for the rebuild.
pub fn build_base_table(
    ground: &[GroundSample],
    view_elevations: Option<&[f64]>,
    effective: EffectiveUnits,
    selected: SelectedUnits,
) -> Result<Vec<ElevationPoint>, ProfileError> {
    if ground.is_empty() {
        return Err(ProfileError::NoGroundProfile);
    }
    if let Some(view) = view_elevations {
        if view.len() != ground.len() {
            return Err(ProfileError::PrecomputedData {
                ground: ground.len(),
                view: view.len(),
            });
        }
    }

    let mut points = Vec::with_capacity(ground.len());
    for (point_index, sample) in ground.iter().enumerate() {
        let view_y = match view_elevations {
            Some(view) => Some(units::convert(
                view[point_index],
                effective.elevation,
                selected.elevation,
            )?),
            None => None,
        };
        points.push(ElevationPoint {
            x: units::convert(sample.distance, effective.distance, selected.distance)?,
            y: units::convert(sample.elevation, effective.elevation, selected.elevation)?,
            view_y,
            map_x: sample.map_x,
            map_y: sample.map_y,
            point_index,
            profile_layer: None,
            series: BTreeMap::new(),
        });
    }
    Ok(points)
}
