//! Driver attribution for model-based scores.
//!
//! Explains a score as per-feature deviations from the training-set
//! means, weighted by whatever the fitted model exposes (linear
//! coefficients or tree importances).

use super::features::FEATURE_NAMES;
use super::score::{rank_drivers, round_to, Direction, Driver};

/// Minimum |contribution| for a feature to surface as a driver.
const CONTRIBUTION_FLOOR: f64 = 1e-4;

/// Attribute a score to individual features.
///
/// `reference_means` is the per-feature training-set mean recorded in
/// the artifact metadata; `weights` come from the model (coefficients
/// or importances). Returns at most 6 ranked drivers; may be empty when
/// no contribution clears the floor.
#[must_use]
pub fn attribute(vector: &[f64], reference_means: &[f64], weights: &[f64]) -> Vec<Driver> {
    let mut drivers = Vec::new();

    for (idx, ((value, mean), weight)) in vector
        .iter()
        .zip(reference_means)
        .zip(weights)
        .enumerate()
    {
        let contribution = (value - mean) * weight;
        if contribution.abs() < CONTRIBUTION_FLOOR {
            continue;
        }
        drivers.push(Driver {
            name: FEATURE_NAMES[idx].to_string(),
            value: round_to(*value, 4),
            direction: if contribution >= 0.0 {
                Direction::Up
            } else {
                Direction::Down
            },
            contribution: round_to(contribution, 4),
        });
    }

    rank_drivers(drivers)
}
