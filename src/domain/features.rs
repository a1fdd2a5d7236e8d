//! Feature vector types for risk scoring.
//!
//! 13 longitudinal signals computed upstream from the subject's
//! biometric history. The name-to-index mapping is fixed and shared by
//! every scoring strategy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Arity of the scoring contract.
pub const FEATURE_COUNT: usize = 13;

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "bp_sys_trend_14d",
    "bp_sys_var_7d",
    "bp_dia_trend_14d",
    "bp_dia_var_7d",
    "hrv_z_7d",
    "rhr_z_7d",
    "steps_z_7d",
    "sleep_debt_hours_7d",
    "weight_trend_14d",
    "glucose_trend_14d",
    "a1c_latest",
    "ldl_latest",
    "adherence_nudge_7d",
];

/// Raw scoring request payload.
///
/// Absent fields take per-field defaults at resolution time: most
/// default to 0.0, `adherence_nudge_7d` to 0.5, and the two lab values
/// (`a1c_latest`, `ldl_latest`) are coerced from "not supplied" to 0.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureInput {
    /// Subject identifier, used for logging only.
    pub user_id: Option<String>,

    /// Calendar date the features describe (`YYYY-MM-DD`), echoed back
    /// in score responses.
    pub as_of_date: String,

    pub bp_sys_trend_14d: Option<f64>,
    pub bp_sys_var_7d: Option<f64>,
    pub bp_dia_trend_14d: Option<f64>,
    pub bp_dia_var_7d: Option<f64>,
    pub hrv_z_7d: Option<f64>,
    pub rhr_z_7d: Option<f64>,
    pub steps_z_7d: Option<f64>,
    pub sleep_debt_hours_7d: Option<f64>,
    pub weight_trend_14d: Option<f64>,
    pub glucose_trend_14d: Option<f64>,
    pub a1c_latest: Option<f64>,
    pub ldl_latest: Option<f64>,
    pub adherence_nudge_7d: Option<f64>,
}

impl FeatureInput {
    /// Validate the request-level invariants.
    ///
    /// # Errors
    /// Returns a message if `as_of_date` is not a valid calendar date
    /// or `adherence_nudge_7d` falls outside [0, 1].
    pub fn validate(&self) -> Result<(), String> {
        NaiveDate::parse_from_str(&self.as_of_date, "%Y-%m-%d")
            .map_err(|_| format!("as_of_date '{}' is not a valid YYYY-MM-DD date", self.as_of_date))?;

        if let Some(adherence) = self.adherence_nudge_7d {
            if !(0.0..=1.0).contains(&adherence) {
                return Err("adherence_nudge_7d must be in [0, 1]".to_string());
            }
        }
        Ok(())
    }

    /// Resolve optional fields into the fixed feature vector.
    #[must_use]
    pub fn resolve(&self) -> FeatureVector {
        FeatureVector {
            bp_sys_trend_14d: self.bp_sys_trend_14d.unwrap_or(0.0),
            bp_sys_var_7d: self.bp_sys_var_7d.unwrap_or(0.0),
            bp_dia_trend_14d: self.bp_dia_trend_14d.unwrap_or(0.0),
            bp_dia_var_7d: self.bp_dia_var_7d.unwrap_or(0.0),
            hrv_z_7d: self.hrv_z_7d.unwrap_or(0.0),
            rhr_z_7d: self.rhr_z_7d.unwrap_or(0.0),
            steps_z_7d: self.steps_z_7d.unwrap_or(0.0),
            sleep_debt_hours_7d: self.sleep_debt_hours_7d.unwrap_or(0.0),
            weight_trend_14d: self.weight_trend_14d.unwrap_or(0.0),
            glucose_trend_14d: self.glucose_trend_14d.unwrap_or(0.0),
            // No value supplied is coerced to 0.0 for both lab fields,
            // which conflates "exactly zero" with "unknown".
            a1c_latest: self.a1c_latest.unwrap_or(0.0),
            ldl_latest: self.ldl_latest.unwrap_or(0.0),
            adherence_nudge_7d: self.adherence_nudge_7d.unwrap_or(0.5),
        }
    }
}

/// Resolved, immutable feature vector consumed by scoring strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub bp_sys_trend_14d: f64,
    pub bp_sys_var_7d: f64,
    pub bp_dia_trend_14d: f64,
    pub bp_dia_var_7d: f64,
    pub hrv_z_7d: f64,
    pub rhr_z_7d: f64,
    pub steps_z_7d: f64,
    pub sleep_debt_hours_7d: f64,
    pub weight_trend_14d: f64,
    pub glucose_trend_14d: f64,
    pub a1c_latest: f64,
    pub ldl_latest: f64,
    pub adherence_nudge_7d: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order.
    #[must_use]
    pub fn as_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.bp_sys_trend_14d,
            self.bp_sys_var_7d,
            self.bp_dia_trend_14d,
            self.bp_dia_var_7d,
            self.hrv_z_7d,
            self.rhr_z_7d,
            self.steps_z_7d,
            self.sleep_debt_hours_7d,
            self.weight_trend_14d,
            self.glucose_trend_14d,
            self.a1c_latest,
            self.ldl_latest,
            self.adherence_nudge_7d,
        ]
    }
}
