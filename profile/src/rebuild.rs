use crate::{
    bounds::{adjusted_bounds, AxisBounds, BoundsParams},
    config::{AssetLayerConfig, ProfileLayerConfig},
    error::{ProfileError, QueryError},
    export,
    geom::{MapProjection, PathGeometry},
    intersect::{inject_intersections, IntersectionHit, LayerIntersections},
    layers::{inject_profile_layers, SelectedFeature},
    point::{ElevationPoint, SeriesKey},
    sample::{build_base_table, EffectiveUnits, GroundSample, GroundStats, SelectedUnits},
    tracker::{IntersectionEntry, IntersectionIndex, LayerExtremes, SeriesTracker},
};
use log::{debug, warn};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

/// Shared cancellation flag for an in-flight rebuild. A newer request
/// cancels the older one's token; the older rebuild then fails with
/// [`ProfileError::Aborted`] instead of publishing a stale table.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ProfileError> {
        if self.is_cancelled() {
            Err(ProfileError::Aborted)
        } else {
            Ok(())
        }
    }
}

/// Queries asset features intersecting the drawn path, one layer at a
/// time. A failed query only loses that layer's series; the rebuild
/// carries on.
pub trait IntersectionSource {
    fn query(
        &self,
        config: &AssetLayerConfig,
        path: &PathGeometry,
    ) -> Result<Vec<IntersectionHit>, QueryError>;
}

/// Everything one rebuild needs, captured up front so a newer request
/// can't mutate it mid-flight.
#[derive(Debug, Clone)]
pub struct RebuildInput {
    pub samples: Vec<GroundSample>,
    pub view_elevations: Option<Vec<f64>>,
    pub effective: EffectiveUnits,
    pub selected: SelectedUnits,
    pub path: PathGeometry,
    pub projection: MapProjection,
    pub selected_features: Vec<SelectedFeature>,
    pub profile_layers: Vec<ProfileLayerConfig>,
    pub asset_layers: Vec<AssetLayerConfig>,

    /// Ground statistics from the sampling service; derived from the
    /// samples when absent.
    pub stats: Option<GroundStats>,
}

/// The finished table and its lookup side-tables.
#[derive(Debug)]
pub struct ProfileData {
    pub points: Vec<ElevationPoint>,
    pub extremes: LayerExtremes,
    pub intersections: IntersectionIndex,

    /// Per-row intersection marker: `Some(point_index)` on rows that
    /// carry at least one intersection.
    pub intersection_flags: Vec<Option<usize>>,

    /// Per-row profile-layer series value, keyed by point index.
    pub profile_series: HashMap<usize, (SeriesKey, f64)>,

    pub stats: GroundStats,
    pub effective: EffectiveUnits,
    pub selected: SelectedUnits,
    pub flipped: bool,
}

impl ProfileData {
    /// Mirrors the x axis in place. Lookup side-tables stay valid:
    /// they join on `point_index`, which flipping never reassigns.
    pub fn flip(&mut self) {
        export::flip(&mut self.points);
        self.flipped = !self.flipped;
    }

    pub fn total_distance(&self) -> f64 {
        self.points
            .iter()
            .fold(0.0_f64, |acc, point| acc.max(point.x))
    }

    /// Row nearest to an x position, for hover lookups.
    pub fn nearest_point_index(&self, x: f64) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.x - x)
                    .abs()
                    .partial_cmp(&(b.x - x).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(index, _)| index)
    }

    pub fn has_intersection(&self, index: usize) -> bool {
        matches!(self.intersection_flags.get(index), Some(Some(_)))
    }

    /// Intersection entries on a row, deduplicated for tooltips: a
    /// feature recorded on the row more than once at the same value
    /// shows once.
    pub fn entries_at(&self, point_index: usize) -> Vec<&IntersectionEntry> {
        let mut seen = Vec::new();
        let mut entries = Vec::new();
        if let Some(layers) = self.intersections.get(&point_index) {
            for layer_entries in layers.values() {
                for entry in layer_entries {
                    let id = (
                        entry.key.layer().to_string(),
                        entry.feature,
                        entry.value.to_bits(),
                    );
                    if seen.contains(&id) {
                        continue;
                    }
                    seen.push(id);
                    entries.push(entry);
                }
            }
        }
        entries
    }

    /// Profile-layer series value on a row, if a profile layer covers
    /// it.
    pub fn profile_series_at(&self, point_index: usize) -> Option<(&SeriesKey, f64)> {
        self.profile_series
            .get(&point_index)
            .map(|(key, value)| (key, *value))
    }

    pub fn bounds(
        &self,
        pixel_width: f64,
        pixel_height: f64,
        uniform_scaling: bool,
        dynamic_elevation_range: bool,
    ) -> Result<AxisBounds, ProfileError> {
        adjusted_bounds(BoundsParams {
            stats: self.stats,
            effective: self.effective,
            selected: self.selected,
            extremes: &self.extremes,
            pixel_width,
            pixel_height,
            uniform_scaling,
            dynamic_elevation_range,
        })
    }
}

/// Runs the full pipeline: base table, profile-layer injection, then
/// asset-layer intersection injection. Checks the cancel token between
/// stages and refuses to publish a cancelled rebuild.
pub fn build_profile<S>(
    input: &RebuildInput,
    source: &S,
    cancel: &CancelToken,
) -> Result<ProfileData, ProfileError>
where
    S: IntersectionSource + ?Sized,
{
    let started = Instant::now();
    cancel.check()?;

    let mut points = build_base_table(
        &input.samples,
        input.view_elevations.as_deref(),
        input.effective,
        input.selected,
    )?;
    let mut tracker = SeriesTracker::new(points.len());
    cancel.check()?;

    inject_profile_layers(
        &mut points,
        &mut tracker,
        &input.selected_features,
        &input.profile_layers,
        input.projection,
        input.selected,
    )?;
    cancel.check()?;

    let mut queried = Vec::with_capacity(input.asset_layers.len());
    for config in &input.asset_layers {
        match source.query(config, &input.path) {
            Ok(hits) => queried.push(LayerIntersections {
                config: config.clone(),
                hits,
            }),
            Err(err) => warn!("skipping asset layer {}: {err}", config.layer_id),
        }
        cancel.check()?;
    }
    for layer in &queried {
        inject_intersections(
            &mut points,
            &mut tracker,
            layer,
            &input.path,
            input.projection,
            input.selected,
        )?;
        cancel.check()?;
    }

    let stats = match input.stats {
        Some(stats) => stats,
        None => GroundStats::from_samples(&input.samples).ok_or(ProfileError::NoGroundProfile)?,
    };
    cancel.check()?;

    let parts = tracker.into_parts();
    debug!(
        "profile rebuild: {} rows, {} asset layers, {:?}",
        points.len(),
        queried.len(),
        started.elapsed()
    );
    Ok(ProfileData {
        points,
        extremes: parts.extremes,
        intersections: parts.intersections,
        intersection_flags: parts.flags,
        profile_series: parts.profile_series,
        stats,
        effective: input.effective,
        selected: input.selected,
        flipped: false,
    })
}
