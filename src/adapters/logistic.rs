//! Logistic-regression estimator.
//!
//! Full-batch gradient descent on standardized features. After fitting,
//! the scaler is folded back into raw-space coefficients so prediction
//! and attribution both work directly on raw feature vectors.
//!
//! Fitting is deterministic: zero initialization, fixed iteration
//! count, no sampling.

use serde::{Deserialize, Serialize};

use crate::domain::ModelType;
use crate::ports::{AttributionSource, Prediction, Predictor};

/// Gradient-descent iteration count.
const MAX_ITERATIONS: usize = 1000;

/// Step size in standardized feature space.
const LEARNING_RATE: f64 = 0.1;

/// A fitted logistic-regression model in raw feature space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    /// Fit on rows of raw features and binary labels.
    #[must_use]
    pub fn fit(x: &[Vec<f64>], y: &[u8]) -> Self {
        let n = x.len();
        let dim = x.first().map_or(0, Vec::len);
        if n == 0 || dim == 0 {
            return Self {
                coefficients: Vec::new(),
                intercept: 0.0,
            };
        }

        // Standardize per feature; zero-variance features stay at zero.
        let mut means = vec![0.0; dim];
        for row in x {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n as f64;
        }

        let mut variances = vec![0.0; dim];
        for row in x {
            for ((variance, value), mean) in variances.iter_mut().zip(row).zip(&means) {
                let delta = value - mean;
                *variance += delta * delta;
            }
        }
        let std_inv: Vec<f64> = variances
            .iter()
            .map(|variance| {
                let std = (variance / n as f64).sqrt();
                if std == 0.0 {
                    0.0
                } else {
                    1.0 / std
                }
            })
            .collect();

        let standardized: Vec<Vec<f64>> = x
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&means)
                    .zip(&std_inv)
                    .map(|((value, mean), inv)| (value - mean) * inv)
                    .collect()
            })
            .collect();

        let mut weights = vec![0.0; dim];
        let mut bias = 0.0;

        for _ in 0..MAX_ITERATIONS {
            let mut grad_w = vec![0.0; dim];
            let mut grad_b = 0.0;

            for (row, &label) in standardized.iter().zip(y) {
                let margin =
                    bias + weights.iter().zip(row).map(|(w, v)| w * v).sum::<f64>();
                let error = sigmoid(margin) - f64::from(label);
                for (grad, value) in grad_w.iter_mut().zip(row) {
                    *grad += error * value;
                }
                grad_b += error;
            }

            for (weight, grad) in weights.iter_mut().zip(&grad_w) {
                *weight -= LEARNING_RATE * grad / n as f64;
            }
            bias -= LEARNING_RATE * grad_b / n as f64;
        }

        // Fold the scaler into raw-space parameters:
        // margin = bias + sum(w_j * (x_j - mean_j) * std_inv_j)
        let coefficients: Vec<f64> = weights
            .iter()
            .zip(&std_inv)
            .map(|(weight, inv)| weight * inv)
            .collect();
        let intercept = bias
            - coefficients
                .iter()
                .zip(&means)
                .map(|(coef, mean)| coef * mean)
                .sum::<f64>();

        Self {
            coefficients,
            intercept,
        }
    }

    fn margin(&self, vector: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(vector)
                .map(|(coef, value)| coef * value)
                .sum::<f64>()
    }
}

impl Predictor for LogisticModel {
    fn predict(&self, vector: &[f64]) -> Prediction {
        Prediction::Probability(sigmoid(self.margin(vector)))
    }

    fn attribution(&self) -> AttributionSource {
        AttributionSource::Coefficients(self.coefficients.clone())
    }

    fn model_type(&self) -> ModelType {
        ModelType::LogisticRegression
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
