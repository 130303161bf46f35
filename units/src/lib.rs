//! Unit conversions and axis rounding for elevation profiles.
//!
//! All conversions go through a fixed meters-per-unit factor table.
//! `Degrees` exists for slope values and is not convertible to any
//! length unit.

mod error;

pub use crate::error::UnitError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinearUnit {
    Millimeters,
    Centimeters,
    Inches,
    Feet,
    Yards,
    Meters,
    Kilometers,
    Miles,
    NauticalMiles,
    Degrees,
}

impl LinearUnit {
    /// Meters per one of this unit, or `None` for angular units.
    fn meters_per_unit(self) -> Option<f64> {
        let factor = match self {
            Self::Millimeters => 0.001,
            Self::Centimeters => 0.01,
            Self::Inches => 0.0254,
            Self::Feet => 0.3048,
            Self::Yards => 0.9144,
            Self::Meters => 1.0,
            Self::Kilometers => 1000.0,
            Self::Miles => 1609.344,
            Self::NauticalMiles => 1852.0,
            Self::Degrees => return None,
        };
        Some(factor)
    }

    pub fn is_angular(self) -> bool {
        matches!(self, Self::Degrees)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Millimeters => "millimeters",
            Self::Centimeters => "centimeters",
            Self::Inches => "inches",
            Self::Feet => "feet",
            Self::Yards => "yards",
            Self::Meters => "meters",
            Self::Kilometers => "kilometers",
            Self::Miles => "miles",
            Self::NauticalMiles => "nautical-miles",
            Self::Degrees => "degrees",
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Millimeters => "mm",
            Self::Centimeters => "cm",
            Self::Inches => "in",
            Self::Feet => "ft",
            Self::Yards => "yd",
            Self::Meters => "m",
            Self::Kilometers => "km",
            Self::Miles => "mi",
            Self::NauticalMiles => "nmi",
            Self::Degrees => "deg",
        }
    }

    pub const ALL: [Self; 10] = [
        Self::Millimeters,
        Self::Centimeters,
        Self::Inches,
        Self::Feet,
        Self::Yards,
        Self::Meters,
        Self::Kilometers,
        Self::Miles,
        Self::NauticalMiles,
        Self::Degrees,
    ];
}

impl fmt::Display for LinearUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for LinearUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, UnitError> {
        let unit = match s {
            "millimeters" | "mm" => Self::Millimeters,
            "centimeters" | "cm" => Self::Centimeters,
            "inches" | "in" => Self::Inches,
            "feet" | "ft" => Self::Feet,
            "yards" | "yd" => Self::Yards,
            "meters" | "m" => Self::Meters,
            "kilometers" | "km" => Self::Kilometers,
            "miles" | "mi" => Self::Miles,
            "nautical-miles" | "nmi" => Self::NauticalMiles,
            "degrees" | "deg" => Self::Degrees,
            other => return Err(UnitError::InvalidUnit(other.to_string())),
        };
        Ok(unit)
    }
}

/// Converts a single value from one unit to another.
pub fn convert(value: f64, from: LinearUnit, to: LinearUnit) -> Result<f64, UnitError> {
    if from == to {
        return Ok(value);
    }
    match (from.meters_per_unit(), to.meters_per_unit()) {
        (Some(from_m), Some(to_m)) => Ok(value * from_m / to_m),
        _ => Err(UnitError::Incompatible(from, to)),
    }
}

/// Element-wise [`convert`] over an ordered sequence. Order and
/// length are preserved.
pub fn convert_distances(
    values: &[f64],
    from: LinearUnit,
    to: LinearUnit,
) -> Result<Vec<f64>, UnitError> {
    values.iter().map(|&v| convert(v, from, to)).collect()
}

/// One raw (distance, elevation) pair as produced by the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleInfo {
    pub distance: f64,
    pub elevation: f64,
}

/// Converts distance and elevation components of every sample,
/// preserving order and length.
pub fn convert_elevation_infos(
    samples: &[SampleInfo],
    from_distance: LinearUnit,
    from_elevation: LinearUnit,
    to_distance: LinearUnit,
    to_elevation: LinearUnit,
) -> Result<Vec<SampleInfo>, UnitError> {
    samples
        .iter()
        .map(|s| {
            Ok(SampleInfo {
                distance: convert(s.distance, from_distance, to_distance)?,
                elevation: convert(s.elevation, from_elevation, to_elevation)?,
            })
        })
        .collect()
}

/// Expands `[min, max]` outward to the nearest "nice" step (1/2/5 ×
/// 10^k) so an axis built on the result has clean tick labels.
///
/// Guarantees `result.0 <= min` and `result.1 >= max`.
pub fn nice_scale(min: f64, max: f64, target_ticks: usize) -> (f64, f64) {
    if !(max > min) || !min.is_finite() || !max.is_finite() {
        return (min - 1.0, max + 1.0);
    }
    let ticks = target_ticks.max(2) as f64;
    let range = nice_num(max - min, false);
    let step = nice_num(range / (ticks - 1.0), true);
    let nice_min = (min / step).floor() * step;
    let nice_max = (max / step).ceil() * step;
    (nice_min, nice_max)
}

/// Rounds `value` to a "nice" number; `round` picks the nearest nice
/// fraction rather than the smallest one covering `value`.
fn nice_num(value: f64, round: bool) -> f64 {
    let exponent = value.log10().floor();
    let fraction = value / 10f64.powf(exponent);
    let nice_fraction = if round {
        match fraction {
            f if f < 1.5 => 1.0,
            f if f < 3.0 => 2.0,
            f if f < 7.0 => 5.0,
            _ => 10.0,
        }
    } else {
        match fraction {
            f if f <= 1.0 => 1.0,
            f if f <= 2.0 => 2.0,
            f if f <= 5.0 => 5.0,
            _ => 10.0,
        }
    };
    nice_fraction * 10f64.powf(exponent)
}
