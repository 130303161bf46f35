mod options;
mod scenario;

use anyhow::Error as AnyError;
use clap::Parser;
use options::{Cli, Command as CliCmd};
use profile::{
    build_profile, export_rows, intersection_export_rows, AxisBounds, CancelToken, ElevationPoint,
    ExportOptions, GroundStats, IntersectionExportRow, ProfileData, ProfileError,
};
use scenario::Scenario;
use serde::Serialize;
use std::{collections::HashMap, fs::File, io::Write};

fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    env_logger::init();

    let scenario: Scenario = serde_json::from_reader(File::open(&cli.scenario)?)?;
    let layer_ids: Vec<String> = scenario
        .asset_layers
        .iter()
        .map(|layer| layer.layer_id.clone())
        .collect();
    let (input, source) = scenario.into_parts();

    let mut data = build_profile(&input, &source, &CancelToken::new())?;
    if cli.flip {
        data.flip();
    }
    let options = ExportOptions {
        custom_interval: cli.interval,
        flipped: data.flipped,
    };

    match cli.cmd {
        CliCmd::Csv => print_csv(&data, &layer_ids, options)?,
        CliCmd::Json => print_json(&data, &layer_ids, options, &cli)?,
        CliCmd::Bounds => print_bounds(&data, &cli)?,
    };
    Ok(())
}

fn chart_bounds(data: &ProfileData, cli: &Cli) -> Result<AxisBounds, ProfileError> {
    data.bounds(cli.width, cli.height, cli.uniform, cli.dynamic_range)
}

fn print_csv(
    data: &ProfileData,
    layers: &[String],
    options: ExportOptions,
) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(
        stdout,
        "Distance ({}),Elevation ({}),ViewElevation,MapX,MapY",
        data.selected.distance.abbreviation(),
        data.selected.elevation.abbreviation(),
    )?;
    for point in export_rows(&data.points, options) {
        let view = point.view_y.map(|v| v.to_string()).unwrap_or_default();
        writeln!(
            stdout,
            "{},{},{view},{},{}",
            point.x, point.y, point.map_x, point.map_y,
        )?;
    }

    for layer in layers {
        let rows = intersection_export_rows(&data.points, &data.intersections, layer, data.flipped);
        if rows.is_empty() {
            continue;
        }
        writeln!(stdout)?;
        writeln!(stdout, "Series,Distance,Value,Value2,Display,MapX,MapY")?;
        for row in rows {
            let value2 = row.value2.map(|v| v.to_string()).unwrap_or_default();
            let display = row.display_value.as_deref().unwrap_or("");
            writeln!(
                stdout,
                "{},{},{},{value2},{display},{},{}",
                row.series, row.x, row.value, row.map_x, row.map_y,
            )?;
        }
    }
    Ok(())
}

fn print_json(
    data: &ProfileData,
    layers: &[String],
    options: ExportOptions,
    cli: &Cli,
) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct JsonProfile<'a> {
        points: Vec<&'a ElevationPoint>,
        intersections: HashMap<&'a str, Vec<IntersectionExportRow>>,
        stats: GroundStats,
        bounds: AxisBounds,
        flipped: bool,
    }

    let intersections = layers
        .iter()
        .map(|layer| {
            (
                layer.as_str(),
                intersection_export_rows(&data.points, &data.intersections, layer, data.flipped),
            )
        })
        .filter(|(_, rows)| !rows.is_empty())
        .collect();
    let reshaped = JsonProfile {
        points: export_rows(&data.points, options),
        intersections,
        stats: data.stats,
        bounds: chart_bounds(data, cli)?,
        flipped: data.flipped,
    };
    let json = serde_json::to_string(&reshaped)?;
    println!("{json}");
    Ok(())
}

fn print_bounds(data: &ProfileData, cli: &Cli) -> Result<(), AnyError> {
    let bounds = chart_bounds(data, cli)?;
    println!("{}", serde_json::to_string(&bounds)?);
    Ok(())
}
