//! Gradient-boosted tree estimator.
//!
//! Regression trees fitted to the logistic-loss gradient with Newton
//! leaf values. Split search is exhaustive and greedy over every
//! feature and boundary, so fitting is fully deterministic with no
//! sampling involved.

use serde::{Deserialize, Serialize};

use crate::domain::ModelType;
use crate::ports::{AttributionSource, Prediction, Predictor};

/// Number of boosting rounds.
const N_TREES: usize = 80;

/// Maximum tree depth.
const MAX_DEPTH: usize = 3;

/// Shrinkage applied to every tree's output.
const LEARNING_RATE: f64 = 0.08;

/// Guard against division by a vanishing hessian sum.
const HESSIAN_EPS: f64 = 1e-12;

/// Minimum gain for a split to be kept.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn evaluate(&self, vector: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { value } => return *value,
                Self::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if vector[*feature] < *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// A fitted gradient-boosted tree ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedModel {
    base_margin: f64,
    trees: Vec<Node>,
    /// Split-gain importances, normalized to sum to 1.
    importances: Vec<f64>,
}

impl GradientBoostedModel {
    /// Fit on rows of raw features and binary labels.
    #[must_use]
    pub fn fit(x: &[Vec<f64>], y: &[u8]) -> Self {
        let n = x.len();
        let dim = x.first().map_or(0, Vec::len);
        if n == 0 || dim == 0 {
            return Self {
                base_margin: 0.0,
                trees: Vec::new(),
                importances: Vec::new(),
            };
        }

        let positives = y.iter().filter(|&&label| label == 1).count() as f64;
        let prior = (positives / n as f64).clamp(1e-6, 1.0 - 1e-6);
        let base_margin = (prior / (1.0 - prior)).ln();

        let mut margins = vec![base_margin; n];
        let mut gains = vec![0.0; dim];
        let mut trees = Vec::with_capacity(N_TREES);
        let all_rows: Vec<usize> = (0..n).collect();

        for _ in 0..N_TREES {
            let mut grad = Vec::with_capacity(n);
            let mut hess = Vec::with_capacity(n);
            for (margin, &label) in margins.iter().zip(y) {
                let p = sigmoid(*margin);
                grad.push(p - f64::from(label));
                hess.push(p * (1.0 - p));
            }

            let tree = build_node(x, &grad, &hess, &all_rows, MAX_DEPTH, &mut gains);
            for (margin, row) in margins.iter_mut().zip(x) {
                *margin += LEARNING_RATE * tree.evaluate(row);
            }
            trees.push(tree);
        }

        let total_gain: f64 = gains.iter().sum();
        let importances = if total_gain > 0.0 {
            gains.iter().map(|gain| gain / total_gain).collect()
        } else {
            vec![0.0; dim]
        };

        Self {
            base_margin,
            trees,
            importances,
        }
    }

    fn margin(&self, vector: &[f64]) -> f64 {
        self.base_margin
            + self
                .trees
                .iter()
                .map(|tree| LEARNING_RATE * tree.evaluate(vector))
                .sum::<f64>()
    }
}

impl Predictor for GradientBoostedModel {
    fn predict(&self, vector: &[f64]) -> Prediction {
        Prediction::Margin(self.margin(vector))
    }

    fn attribution(&self) -> AttributionSource {
        AttributionSource::Importances(self.importances.clone())
    }

    fn model_type(&self) -> ModelType {
        ModelType::BoostedTrees
    }
}

/// Newton step for the rows falling into a leaf.
fn leaf_value(grad_sum: f64, hess_sum: f64) -> f64 {
    -grad_sum / (hess_sum + HESSIAN_EPS)
}

fn score(grad_sum: f64, hess_sum: f64) -> f64 {
    grad_sum * grad_sum / (hess_sum + HESSIAN_EPS)
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

fn build_node(
    x: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    depth: usize,
    gains: &mut [f64],
) -> Node {
    let grad_sum: f64 = rows.iter().map(|&row| grad[row]).sum();
    let hess_sum: f64 = rows.iter().map(|&row| hess[row]).sum();

    if depth == 0 || rows.len() < 2 {
        return Node::Leaf {
            value: leaf_value(grad_sum, hess_sum),
        };
    }

    let Some(best) = find_best_split(x, grad, hess, rows, grad_sum, hess_sum) else {
        return Node::Leaf {
            value: leaf_value(grad_sum, hess_sum),
        };
    };

    gains[best.feature] += best.gain;

    Node::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(build_node(x, grad, hess, &best.left, depth - 1, gains)),
        right: Box::new(build_node(x, grad, hess, &best.right, depth - 1, gains)),
    }
}

fn find_best_split(
    x: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    grad_sum: f64,
    hess_sum: f64,
) -> Option<BestSplit> {
    let dim = x[rows[0]].len();
    let parent_score = score(grad_sum, hess_sum);
    let mut best: Option<BestSplit> = None;

    for feature in 0..dim {
        let mut ordered: Vec<usize> = rows.to_vec();
        ordered.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_grad = 0.0;
        let mut left_hess = 0.0;

        for boundary in 1..ordered.len() {
            let previous = x[ordered[boundary - 1]][feature];
            let current = x[ordered[boundary]][feature];
            left_grad += grad[ordered[boundary - 1]];
            left_hess += hess[ordered[boundary - 1]];

            if previous == current {
                continue;
            }

            let gain = 0.5
                * (score(left_grad, left_hess)
                    + score(grad_sum - left_grad, hess_sum - left_hess)
                    - parent_score);
            if gain <= MIN_GAIN {
                continue;
            }

            // Strictly better gain wins; ties keep the earliest feature
            // and boundary, so refits are byte-identical.
            if best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(BestSplit {
                    feature,
                    threshold: (previous + current) / 2.0,
                    gain,
                    left: ordered[..boundary].to_vec(),
                    right: ordered[boundary..].to_vec(),
                });
            }
        }
    }

    best
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
