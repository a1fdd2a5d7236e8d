//! Training pipeline: label thresholding, holdout split, fitting and
//! evaluation.
//!
//! The pipeline is deterministic end to end: the only randomness is
//! the stratified holdout shuffle, driven by a fixed seed.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::adapters::{boosted::GradientBoostedModel, logistic::LogisticModel, TrainedModel};
use crate::domain::{clip, FeatureVector, ModelType, TrainingMetrics, FEATURE_COUNT};
use crate::ports::Predictor;
use crate::{Result, RiskError};

/// Environment variable declaring the estimator family.
pub const ESTIMATOR_ENV: &str = "RISK_ESTIMATOR";

/// Seed for the stratified holdout shuffle.
const SPLIT_SEED: u64 = 42;

/// Fraction of rows held out for evaluation.
const HOLDOUT_FRACTION: f64 = 0.2;

/// Minimum dataset size before a holdout split is attempted.
const MIN_ROWS_FOR_HOLDOUT: usize = 20;

/// Probability clipping bound for the log-loss.
const PROB_FLOOR: f64 = 1e-6;

/// One labeled training example.
#[derive(Debug, Clone)]
pub struct LabeledRow {
    pub features: FeatureVector,
    /// Continuous label, thresholded at 0.5 into a binary class.
    pub label: f64,
}

/// Estimator family declared by deployment configuration.
///
/// The choice is a configuration-time decision: the deployment states
/// which family it runs, and training never falls back at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EstimatorFamily {
    #[default]
    BoostedTrees,
    Logistic,
}

impl EstimatorFamily {
    /// Family from `RISK_ESTIMATOR` (`boosted` | `logistic`).
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(ESTIMATOR_ENV).as_deref() {
            Ok("logistic") => Self::Logistic,
            _ => Self::BoostedTrees,
        }
    }
}

/// Everything the lifecycle manager needs from a completed run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub model_type: ModelType,
    pub metrics: TrainingMetrics,
    /// Per-feature mean over the training split, the attribution
    /// reference for every score this model produces.
    pub feature_means: Vec<f64>,
    pub n_samples: usize,
}

/// Run the pipeline over labeled rows.
///
/// # Errors
/// Returns `RiskError::Validation` when thresholding leaves fewer than
/// two classes; nothing is fitted or persisted in that case.
pub fn run_training(rows: &[LabeledRow], family: EstimatorFamily) -> Result<TrainingOutcome> {
    let x: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| row.features.as_vector().to_vec())
        .collect();
    let y: Vec<u8> = rows.iter().map(|row| u8::from(row.label >= 0.5)).collect();

    if !(y.contains(&0) && y.contains(&1)) {
        return Err(RiskError::Validation(
            "training labels must contain at least two classes after thresholding at 0.5"
                .to_string(),
        ));
    }

    let (train_rows, eval_rows) = split_dataset(&y);
    if train_rows.len() == x.len() {
        tracing::warn!(
            n_rows = x.len(),
            "dataset too small for a holdout split; evaluating on the training set"
        );
    }

    let x_train: Vec<Vec<f64>> = train_rows.iter().map(|&row| x[row].clone()).collect();
    let y_train: Vec<u8> = train_rows.iter().map(|&row| y[row]).collect();
    let x_eval: Vec<Vec<f64>> = eval_rows.iter().map(|&row| x[row].clone()).collect();
    let y_eval: Vec<u8> = eval_rows.iter().map(|&row| y[row]).collect();

    let (model, model_type) = match family {
        EstimatorFamily::BoostedTrees => (
            TrainedModel::BoostedTrees(GradientBoostedModel::fit(&x_train, &y_train)),
            ModelType::BoostedTrees,
        ),
        EstimatorFamily::Logistic => (
            TrainedModel::Logistic(LogisticModel::fit(&x_train, &y_train)),
            ModelType::LogisticRegression,
        ),
    };

    let probabilities: Vec<f64> = x_eval
        .iter()
        .map(|row| model.predict(row).into_probability())
        .collect();
    let metrics = TrainingMetrics {
        auc: roc_auc(&y_eval, &probabilities),
        logloss: log_loss(&y_eval, &probabilities),
    };

    Ok(TrainingOutcome {
        model,
        model_type,
        metrics,
        feature_means: column_means(&x_train),
        n_samples: rows.len(),
    })
}

/// Split row indices into (train, eval).
///
/// Datasets under [`MIN_ROWS_FOR_HOLDOUT`] evaluate on the full
/// training set. Larger datasets hold out roughly 20% per class; a
/// class too small to spare a row stays entirely in the training
/// split.
fn split_dataset(y: &[u8]) -> (Vec<usize>, Vec<usize>) {
    let n = y.len();
    if n < MIN_ROWS_FOR_HOLDOUT {
        return ((0..n).collect(), (0..n).collect());
    }

    let mut rng = ChaCha20Rng::seed_from_u64(SPLIT_SEED);
    let mut train = Vec::new();
    let mut eval = Vec::new();

    for class in [0u8, 1u8] {
        let mut members: Vec<usize> = (0..n).filter(|&row| y[row] == class).collect();
        if members.len() < 2 {
            train.append(&mut members);
            continue;
        }
        members.shuffle(&mut rng);

        let held = ((members.len() as f64 * HOLDOUT_FRACTION).round() as usize)
            .clamp(1, members.len() - 1);
        eval.extend_from_slice(&members[..held]);
        train.extend_from_slice(&members[held..]);
    }

    train.sort_unstable();
    eval.sort_unstable();
    (train, eval)
}

/// Rank-based AUC with average ranks for ties.
///
/// `None` when the evaluation set contains a single class.
fn roc_auc(y: &[u8], probabilities: &[f64]) -> Option<f64> {
    let positives = y.iter().filter(|&&label| label == 1).count();
    let negatives = y.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| probabilities[a].total_cmp(&probabilities[b]));

    let mut ranks = vec![0.0; probabilities.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && probabilities[order[end + 1]] == probabilities[order[start]]
        {
            end += 1;
        }
        let average = (start + end) as f64 / 2.0 + 1.0;
        for &row in &order[start..=end] {
            ranks[row] = average;
        }
        start = end + 1;
    }

    let positive_rank_sum: f64 = y
        .iter()
        .zip(&ranks)
        .filter(|(&label, _)| label == 1)
        .map(|(_, rank)| rank)
        .sum();

    let auc = (positive_rank_sum - (positives * (positives + 1)) as f64 / 2.0)
        / (positives * negatives) as f64;
    auc.is_finite().then_some(auc)
}

/// Mean binary log-loss with clipped probabilities.
///
/// `None` on an empty set or a non-finite result.
fn log_loss(y: &[u8], probabilities: &[f64]) -> Option<f64> {
    if y.is_empty() {
        return None;
    }
    let total: f64 = y
        .iter()
        .zip(probabilities)
        .map(|(&label, &p)| {
            let p = clip(p, PROB_FLOOR, 1.0 - PROB_FLOOR);
            if label == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    let loss = total / y.len() as f64;
    loss.is_finite().then_some(loss)
}

fn column_means(x: &[Vec<f64>]) -> Vec<f64> {
    let mut means = vec![0.0; FEATURE_COUNT];
    for row in x {
        for (mean, value) in means.iter_mut().zip(row) {
            *mean += value;
        }
    }
    for mean in &mut means {
        *mean /= x.len() as f64;
    }
    means
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(profile: f64, label: f64) -> LabeledRow {
        let mut features = FeatureVector {
            bp_sys_trend_14d: profile * 5.0,
            bp_sys_var_7d: profile * 10.0,
            bp_dia_trend_14d: profile * 3.0,
            bp_dia_var_7d: profile * 7.0,
            hrv_z_7d: -profile,
            rhr_z_7d: profile * 0.8,
            steps_z_7d: -profile * 1.4,
            sleep_debt_hours_7d: profile * 6.0,
            weight_trend_14d: profile * 0.6,
            glucose_trend_14d: profile * 8.0,
            a1c_latest: 5.0 + profile,
            ldl_latest: 90.0 + profile * 60.0,
            adherence_nudge_7d: 0.9 - profile * 0.7,
        };
        if profile <= 0.0 {
            features.hrv_z_7d = 0.4;
        }
        LabeledRow {
            features,
            label,
        }
    }

    fn labeled_rows(n: usize) -> Vec<LabeledRow> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    row(1.0, 1.0)
                } else {
                    row(0.0, 0.0)
                }
            })
            .collect()
    }

    #[test]
    fn test_single_class_rejected() {
        let rows: Vec<LabeledRow> = (0..10).map(|_| row(0.0, 0.0)).collect();
        let err = run_training(&rows, EstimatorFamily::BoostedTrees).unwrap_err();
        assert!(matches!(err, RiskError::Validation(_)));
        assert!(err.to_string().contains("two classes"));
    }

    #[test]
    fn test_small_dataset_evaluates_on_itself() {
        let y = vec![0, 1, 0, 1, 0, 1];
        let (train, eval) = split_dataset(&y);
        assert_eq!(train, eval);
        assert_eq!(train.len(), y.len());
    }

    #[test]
    fn test_stratified_split_shapes() {
        let y: Vec<u8> = (0..30).map(|i| u8::from(i % 2 == 0)).collect();
        let (train, eval) = split_dataset(&y);

        assert_eq!(train.len() + eval.len(), 30);
        assert_eq!(eval.len(), 6);
        // Both classes survive in both splits.
        assert!(eval.iter().any(|&row| y[row] == 0));
        assert!(eval.iter().any(|&row| y[row] == 1));
        assert!(train.iter().any(|&row| y[row] == 0));
        assert!(train.iter().any(|&row| y[row] == 1));

        // Deterministic across calls.
        let (train_again, eval_again) = split_dataset(&y);
        assert_eq!(train, train_again);
        assert_eq!(eval, eval_again);
    }

    #[test]
    fn test_auc_known_values() {
        let y = [0, 0, 1, 1];
        assert!((roc_auc(&y, &[0.1, 0.2, 0.8, 0.9]).expect("defined") - 1.0).abs() < 1e-12);
        assert!((roc_auc(&y, &[0.9, 0.8, 0.2, 0.1]).expect("defined") - 0.0).abs() < 1e-12);
        assert!((roc_auc(&y, &[0.5, 0.5, 0.5, 0.5]).expect("defined") - 0.5).abs() < 1e-12);
        assert!(roc_auc(&[1, 1, 1], &[0.5, 0.6, 0.7]).is_none());
    }

    #[test]
    fn test_log_loss_bounds() {
        let y = [0, 1];
        let perfect = log_loss(&y, &[0.0, 1.0]).expect("defined");
        assert!(perfect < 1e-5);

        let inverted = log_loss(&y, &[1.0, 0.0]).expect("defined");
        assert!(inverted > perfect);
        assert!(inverted.is_finite());
    }

    #[test]
    fn test_training_produces_separating_model() {
        let outcome =
            run_training(&labeled_rows(30), EstimatorFamily::BoostedTrees).expect("Should train");

        assert_eq!(outcome.n_samples, 30);
        assert_eq!(outcome.model_type, ModelType::BoostedTrees);
        assert_eq!(outcome.feature_means.len(), FEATURE_COUNT);

        let auc = outcome.metrics.auc.expect("both classes in the holdout");
        assert!(auc > 0.9, "expected separable AUC, got {auc}");

        let high = outcome
            .model
            .predict(&row(1.0, 1.0).features.as_vector())
            .into_probability();
        let low = outcome
            .model
            .predict(&row(0.0, 0.0).features.as_vector())
            .into_probability();
        assert!(high > low);
    }

    #[test]
    fn test_logistic_family_respected() {
        let outcome =
            run_training(&labeled_rows(24), EstimatorFamily::Logistic).expect("Should train");
        assert_eq!(outcome.model_type, ModelType::LogisticRegression);
        assert!(matches!(outcome.model, TrainedModel::Logistic(_)));
    }
}
