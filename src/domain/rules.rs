//! Deterministic rule-based risk scorer.
//!
//! A weighted sum of clipped, normalized per-feature signals on top of
//! a fixed baseline. Identical input always yields identical output;
//! there is no state and no external dependency.

use super::features::FeatureVector;
use super::score::{band_for_risk, clip, rank_drivers, round_to, Direction, Driver, ScoreResult};
use super::version::RULE_MODEL_VERSION;

/// Risk before any term contributes.
const BASELINE_RISK: f64 = 0.05;

/// Minimum contribution for a term to surface as a driver.
const NOISE_FLOOR: f64 = 0.01;

/// One term of the rule formula.
struct RuleTerm {
    label: &'static str,
    weight: f64,
    max_signal: f64,
    /// Raw feature value reported on the driver.
    value: fn(&FeatureVector) -> f64,
    /// Non-negative raw signal before normalization.
    signal: fn(&FeatureVector) -> f64,
}

/// Fixed domain knowledge: weights sum to roughly 1.0 beyond the
/// baseline. Treat this table as configuration data.
static RULE_TERMS: [RuleTerm; 13] = [
    RuleTerm {
        label: "Systolic BP trend",
        weight: 0.18,
        max_signal: 12.0,
        value: |f| f.bp_sys_trend_14d,
        signal: |f| f.bp_sys_trend_14d.max(0.0),
    },
    RuleTerm {
        label: "Systolic BP variability",
        weight: 0.10,
        max_signal: 20.0,
        value: |f| f.bp_sys_var_7d,
        signal: |f| f.bp_sys_var_7d.max(0.0),
    },
    RuleTerm {
        label: "Diastolic BP trend",
        weight: 0.08,
        max_signal: 8.0,
        value: |f| f.bp_dia_trend_14d,
        signal: |f| f.bp_dia_trend_14d.max(0.0),
    },
    RuleTerm {
        label: "Diastolic BP variability",
        weight: 0.07,
        max_signal: 15.0,
        value: |f| f.bp_dia_var_7d,
        signal: |f| f.bp_dia_var_7d.max(0.0),
    },
    RuleTerm {
        label: "Low HRV",
        weight: 0.10,
        max_signal: 3.0,
        value: |f| f.hrv_z_7d,
        signal: |f| (-f.hrv_z_7d).max(0.0),
    },
    RuleTerm {
        label: "Elevated resting HR",
        weight: 0.08,
        max_signal: 3.0,
        value: |f| f.rhr_z_7d,
        signal: |f| f.rhr_z_7d.max(0.0),
    },
    RuleTerm {
        label: "Low activity",
        weight: 0.10,
        max_signal: 3.0,
        value: |f| f.steps_z_7d,
        signal: |f| (-f.steps_z_7d).max(0.0),
    },
    RuleTerm {
        label: "Sleep debt",
        weight: 0.12,
        max_signal: 14.0,
        value: |f| f.sleep_debt_hours_7d,
        signal: |f| f.sleep_debt_hours_7d.max(0.0),
    },
    RuleTerm {
        label: "Weight gain trend",
        weight: 0.06,
        max_signal: 3.0,
        value: |f| f.weight_trend_14d,
        signal: |f| f.weight_trend_14d.max(0.0),
    },
    RuleTerm {
        label: "Glucose trend",
        weight: 0.07,
        max_signal: 20.0,
        value: |f| f.glucose_trend_14d,
        signal: |f| f.glucose_trend_14d.max(0.0),
    },
    RuleTerm {
        label: "Elevated A1c",
        weight: 0.03,
        max_signal: 3.0,
        value: |f| f.a1c_latest,
        signal: |f| (f.a1c_latest - 5.7).max(0.0),
    },
    RuleTerm {
        label: "Elevated LDL",
        weight: 0.03,
        max_signal: 80.0,
        value: |f| f.ldl_latest,
        signal: |f| (f.ldl_latest - 100.0).max(0.0),
    },
    RuleTerm {
        label: "Low nudge adherence",
        weight: 0.08,
        max_signal: 0.5,
        value: |f| f.adherence_nudge_7d,
        signal: |f| (0.5 - f.adherence_nudge_7d).max(0.0),
    },
];

/// Score a feature vector with the rule formula alone.
#[must_use]
pub fn score_rule(features: &FeatureVector) -> ScoreResult {
    let mut risk = BASELINE_RISK;
    let mut drivers = Vec::new();

    for term in &RULE_TERMS {
        let raw_signal = (term.signal)(features);
        let normalized = clip(raw_signal / term.max_signal, 0.0, 1.0);
        let contribution = term.weight * normalized;
        risk += contribution;

        if contribution >= NOISE_FLOOR {
            drivers.push(Driver {
                name: term.label.to_string(),
                value: round_to((term.value)(features), 4),
                direction: if contribution >= 0.0 {
                    Direction::Up
                } else {
                    Direction::Down
                },
                contribution: round_to(contribution, 4),
            });
        }
    }

    let risk = clip(risk, 0.0, 1.0);
    let band = band_for_risk(risk);

    if drivers.is_empty() {
        drivers.push(Driver {
            name: "Baseline".to_string(),
            value: BASELINE_RISK,
            direction: Direction::Down,
            contribution: 0.0,
        });
    }

    ScoreResult {
        risk: round_to(risk, 6),
        band,
        drivers: rank_drivers(drivers),
        model_version: RULE_MODEL_VERSION.to_string(),
    }
}
