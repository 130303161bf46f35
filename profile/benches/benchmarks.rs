use criterion::{criterion_group, criterion_main, Criterion};
use geo::geometry::{Coord, LineString};
use profile::{
    build_profile, units::LinearUnit, AssetGeometry, AssetLayerConfig, Attributes, CancelToken,
    EffectiveUnits, ElevationRule, GroundSample, IntersectionHit, IntersectionSource,
    MapProjection, MarkerStyle, PathGeometry, ProfileLayerConfig, QueryError, RebuildInput,
    SelectedFeature, SelectedUnits,
};

const ROWS: usize = 10_000;

struct CannedAssets;

impl IntersectionSource for CannedAssets {
    fn query(
        &self,
        _config: &AssetLayerConfig,
        path: &PathGeometry,
    ) -> Result<Vec<IntersectionHit>, QueryError> {
        let overlap = PathGeometry::single(LineString::from(vec![
            Coord { x: 100.0, y: 0.0 },
            Coord { x: 5_000.0, y: 0.0 },
        ]));
        let _ = path;
        let mut attributes = Attributes::new();
        attributes.insert("ELEV".to_string(), Some(95.0));
        Ok(vec![IntersectionHit {
            geometry: AssetGeometry::Line(overlap.clone()),
            attributes,
            display_value: Some("Main".to_string()),
            connected: vec![overlap],
            disconnected: Vec::new(),
        }])
    }
}

fn rebuild_input() -> RebuildInput {
    let samples: Vec<GroundSample> = (0..ROWS)
        .map(|i| GroundSample {
            map_x: i as f64,
            map_y: 0.0,
            distance: i as f64,
            elevation: 100.0 + (i as f64 / 50.0).sin() * 10.0,
        })
        .collect();
    let line = LineString::from(vec![
        Coord { x: 0.0, y: 0.0 },
        Coord {
            x: ROWS as f64,
            y: 0.0,
        },
    ]);
    let mut attributes = Attributes::new();
    attributes.insert("TOP".to_string(), Some(98.0));
    attributes.insert("BOT".to_string(), Some(88.0));
    RebuildInput {
        samples,
        view_elevations: None,
        effective: EffectiveUnits {
            distance: LinearUnit::Meters,
            elevation: LinearUnit::Meters,
        },
        selected: SelectedUnits {
            distance: LinearUnit::Feet,
            elevation: LinearUnit::Feet,
        },
        path: PathGeometry::single(line.clone()),
        projection: MapProjection::Planar {
            meters_per_unit: 1.0,
        },
        selected_features: vec![SelectedFeature {
            layer_id: "mains".to_string(),
            geometry: PathGeometry::single(line),
            attributes,
        }],
        profile_layers: vec![ProfileLayerConfig {
            layer_id: "mains".to_string(),
            elevation: ElevationRule::TwoField {
                field1: "TOP".to_string(),
                field2: "BOT".to_string(),
                unit: LinearUnit::Meters,
            },
            distance: profile::DistanceRule::Map,
            elevation_mode: profile::ElevationMode::Absolute,
        }],
        asset_layers: vec![AssetLayerConfig {
            layer_id: "assets".to_string(),
            title: "Assets".to_string(),
            elevation: ElevationRule::OneField {
                field1: "ELEV".to_string(),
                unit: LinearUnit::Meters,
            },
            display_field: None,
            style: MarkerStyle::default(),
            segment_point_threshold: 1,
        }],
        stats: None,
    }
}

fn profile_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("Profile Rebuild");

    let input = rebuild_input();
    let cancel = CancelToken::new();

    group.bench_with_input("10k rows", &(input, cancel), |b, (input, cancel)| {
        b.iter(|| build_profile(input, &CannedAssets, cancel).unwrap())
    });
}

criterion_group!(benches, profile_rebuild);
criterion_main!(benches);
