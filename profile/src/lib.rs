mod bounds;
mod config;
mod error;
mod export;
mod geom;
mod intersect;
mod layers;
mod math;
mod point;
mod rebuild;
mod sample;
mod tracker;

pub use crate::{
    bounds::{adjusted_bounds, AxisBounds, BoundsParams},
    config::{
        AssetLayerConfig, Attributes, DistanceRule, ElevationMode, ElevationRule, MarkerShape,
        MarkerStyle, ProfileLayerConfig,
    },
    error::{ProfileError, QueryError},
    export::{export_rows, flip, intersection_export_rows, ExportOptions, IntersectionExportRow},
    geom::{MapProjection, PathGeometry, PointGeometry},
    intersect::{inject_intersections, AssetGeometry, IntersectionHit, LayerIntersections},
    layers::{inject_profile_layers, SelectedFeature},
    point::{ElevationPoint, LayerId, SeriesKey},
    rebuild::{build_profile, CancelToken, IntersectionSource, ProfileData, RebuildInput},
    sample::{build_base_table, EffectiveUnits, GroundSample, GroundStats, SelectedUnits},
    tracker::{IntersectionEntry, IntersectionIndex, LayerExtremes, MinMax, SeriesTracker},
};
pub use geo;
pub use units;
