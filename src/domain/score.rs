//! Risk bands, drivers and score results.

use serde::{Deserialize, Serialize};

/// Coarse three-level risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    /// Low risk, no action needed
    Green,
    /// Elevated risk, monitoring recommended
    Amber,
    /// High risk, intervention recommended
    Red,
}

impl RiskBand {
    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Green => "Low risk - No significant indicators",
            Self::Amber => "Elevated risk - Follow-up recommended",
            Self::Red => "High risk - Immediate consultation advised",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Amber => write!(f, "amber"),
            Self::Red => write!(f, "red"),
        }
    }
}

/// Band thresholds over the continuous risk score.
#[must_use]
pub fn band_for_risk(risk: f64) -> RiskBand {
    if risk < 0.33 {
        RiskBand::Green
    } else if risk < 0.66 {
        RiskBand::Amber
    } else {
        RiskBand::Red
    }
}

/// Clamp a value into [low, high].
#[must_use]
pub fn clip(value: f64, low: f64, high: f64) -> f64 {
    value.max(low).min(high)
}

/// Round to a fixed number of decimal places for presentation.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Direction of a driver's influence on the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// A single feature's contribution to a risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    /// Raw feature value at scoring time.
    pub value: f64,
    pub direction: Direction,
    /// Signed contribution magnitude.
    pub contribution: f64,
}

/// Maximum drivers reported per score.
pub const MAX_DRIVERS: usize = 6;

/// Rank drivers by descending |contribution|, ties broken by ascending
/// name, and truncate to [`MAX_DRIVERS`].
#[must_use]
pub fn rank_drivers(mut drivers: Vec<Driver>) -> Vec<Driver> {
    drivers.sort_by(|a, b| {
        b.contribution
            .abs()
            .total_cmp(&a.contribution.abs())
            .then_with(|| a.name.cmp(&b.name))
    });
    drivers.truncate(MAX_DRIVERS);
    drivers
}

/// Outcome of scoring one feature vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Risk in [0, 1], rounded to 6 decimals.
    pub risk: f64,
    pub band: RiskBand,
    /// Ranked contributing factors, never empty, at most 6.
    pub drivers: Vec<Driver>,
    pub model_version: String,
}
