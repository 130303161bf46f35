use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Build elevation-profile tables from a scenario file.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Scenario description, as JSON.
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Mirror the x axis so the profile reads from the path's far
    /// end.
    #[arg(long, default_value_t = false)]
    pub flip: bool,

    /// Minimum x spacing between exported rows, in the selected
    /// distance unit.
    #[arg(short, long)]
    pub interval: Option<f64>,

    /// Equalize units-per-pixel across both axes.
    #[arg(long, default_value_t = false)]
    pub uniform: bool,

    /// Enforce a minimum elevation span relative to the distance
    /// span.
    #[arg(long, default_value_t = false)]
    pub dynamic_range: bool,

    /// Chart width in pixels, for uniform scaling.
    #[arg(long, default_value_t = 0.0)]
    pub width: f64,

    /// Chart height in pixels, for uniform scaling.
    #[arg(long, default_value_t = 0.0)]
    pub height: f64,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the table and per-layer intersections to stdout.
    Csv,

    /// Print the full profile to stdout.
    Json,

    /// Print the adjusted axis bounds.
    Bounds,
}
