use crate::{
    config::MarkerStyle,
    point::{LayerId, SeriesKey},
};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    fn of(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    fn widen(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }
}

/// Per-layer min/max accumulated across every injected series value.
/// Widens monotonically during one build pass.
pub type LayerExtremes = HashMap<LayerId, MinMax>;

/// One recorded intersection at a table row, keyed for tooltip and
/// export lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub key: SeriesKey,
    pub value: f64,
    pub value2: Option<f64>,
    pub display_value: Option<String>,
    pub marker: MarkerStyle,
    pub feature: usize,
}

/// Intersection entries by point index, then by layer. Ordered maps
/// so export and tooltip iteration is deterministic.
pub type IntersectionIndex = BTreeMap<usize, BTreeMap<LayerId, Vec<IntersectionEntry>>>;

/// Accumulates per-layer extremes and the per-row lookup side-tables
/// during one build pass. Owned by the pass and returned by value;
/// never shared across rebuild generations.
#[derive(Debug)]
pub struct SeriesTracker {
    extremes: LayerExtremes,
    profile_series: HashMap<usize, (SeriesKey, f64)>,
    intersections: IntersectionIndex,
    flags: Vec<Option<usize>>,
}

impl SeriesTracker {
    pub fn new(point_count: usize) -> Self {
        Self {
            extremes: LayerExtremes::new(),
            profile_series: HashMap::new(),
            intersections: IntersectionIndex::new(),
            flags: vec![None; point_count],
        }
    }

    /// Records a profile-layer value at a row. Marks the row as
    /// carrying no intersection data; profile and intersection values
    /// are mutually exclusive markers on the flag array.
    pub fn record_profile(&mut self, point_index: usize, layer: &str, value: f64) {
        self.widen(layer, value);
        self.profile_series.insert(
            point_index,
            (
                SeriesKey::Profile {
                    layer: layer.to_string(),
                },
                value,
            ),
        );
        if let Some(flag) = self.flags.get_mut(point_index) {
            *flag = None;
        }
    }

    /// Records an intersection entry at a row and flags the row as
    /// carrying intersection data.
    pub fn record_intersection(&mut self, point_index: usize, layer: &str, entry: IntersectionEntry) {
        self.widen(layer, entry.value);
        if let Some(value2) = entry.value2 {
            self.widen(layer, value2);
        }
        self.intersections
            .entry(point_index)
            .or_default()
            .entry(layer.to_string())
            .or_default()
            .push(entry);
        if let Some(flag) = self.flags.get_mut(point_index) {
            *flag = Some(point_index);
        }
    }

    fn widen(&mut self, layer: &str, value: f64) {
        match self.extremes.get_mut(layer) {
            Some(minmax) => minmax.widen(value),
            None => {
                self.extremes.insert(layer.to_string(), MinMax::of(value));
            }
        }
    }

    pub fn extremes(&self) -> &LayerExtremes {
        &self.extremes
    }

    pub fn into_parts(self) -> TrackerParts {
        TrackerParts {
            extremes: self.extremes,
            profile_series: self.profile_series,
            intersections: self.intersections,
            flags: self.flags,
        }
    }
}

pub struct TrackerParts {
    pub extremes: LayerExtremes,
    pub profile_series: HashMap<usize, (SeriesKey, f64)>,
    pub intersections: IntersectionIndex,
    pub flags: Vec<Option<usize>>,
}
