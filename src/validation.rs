//! Cross-Validator
//!
//! Out-of-sample estimate that is independent of the in-sample diagnostic
//! fit. Each fold standardizes its training split, fits a regularized
//! estimator (ridge for continuous targets, L2 logistic for binary targets)
//! and scores the held-out split.
//!
//! # Determinism
//!
//! - Row order is shuffled once with a seeded `ChaCha8Rng`
//! - Fold sizes follow `n / k`, the first `n % k` folds take one extra row
//! - Degenerate folds are skipped with a warning, never an error

use crate::claim::TargetKind;
use crate::config::EngineConfig;
use crate::models::logit::probabilities;
use crate::models::FeatureTable;
use crate::stats::{self, Standardizer};
use nalgebra::{DMatrix, DVector};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const INSUFFICIENT_SAMPLES: &str = "Insufficient samples for cross-validation";
pub const SINGLE_CLASS: &str = "Target has a single class; ROC-AUC undefined";

/// Generalization score distribution across folds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    pub folds: usize,
    /// Primary metric: `r2` or `roc_auc`.
    pub scoring: String,
    pub mean_score: Option<f64>,
    pub std_score: Option<f64>,
    pub scores: Vec<f64>,
    /// Auxiliary metric: `rmse` or `accuracy`.
    pub aux_metric: String,
    pub aux_mean: Option<f64>,
    pub aux_scores: Vec<f64>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl CrossValidation {
    fn empty(kind: TargetKind, folds: usize) -> Self {
        let (scoring, aux_metric) = match kind {
            TargetKind::Continuous => ("r2", "rmse"),
            TargetKind::Binary => ("roc_auc", "accuracy"),
        };
        Self {
            folds,
            scoring: scoring.to_string(),
            mean_score: None,
            std_score: None,
            scores: Vec::new(),
            aux_metric: aux_metric.to_string(),
            aux_mean: None,
            aux_scores: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Null scores with a single explanatory warning.
    pub fn unavailable(kind: TargetKind, folds: usize, reason: &str) -> Self {
        let mut cv = Self::empty(kind, folds);
        cv.warnings.push(reason.to_string());
        cv
    }
}

// =============================================================================
// FOLDS
// =============================================================================

/// Held-out index sets for shuffled k-fold.
pub fn kfold_indices(n: usize, k: usize, seed: u64) -> Vec<Vec<usize>> {
    if k == 0 {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        folds.push(order[start..start + size].to_vec());
        start += size;
    }
    folds
}

fn split(table: &FeatureTable, test: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>, Vec<Vec<f64>>, Vec<f64>) {
    let mut in_test = vec![false; table.len()];
    for &i in test {
        in_test[i] = true;
    }
    let mut train_x = Vec::new();
    let mut train_y = Vec::new();
    let mut test_x = Vec::new();
    let mut test_y = Vec::new();
    for (i, row) in table.rows.iter().enumerate() {
        if in_test[i] {
            test_x.push(row.clone());
            test_y.push(table.target[i]);
        } else {
            train_x.push(row.clone());
            train_y.push(table.target[i]);
        }
    }
    (train_x, train_y, test_x, test_y)
}

fn to_matrix(rows: &[Vec<f64>], with_intercept: bool) -> DMatrix<f64> {
    let width = rows.first().map_or(0, |r| r.len()) + usize::from(with_intercept);
    DMatrix::from_fn(rows.len(), width, |i, j| {
        if with_intercept {
            if j == 0 {
                1.0
            } else {
                rows[i][j - 1]
            }
        } else {
            rows[i][j]
        }
    })
}

// =============================================================================
// ESTIMATORS
// =============================================================================

/// Ridge regression on standardized features; intercept is the training mean.
fn ridge_predict(
    train_x: &[Vec<f64>],
    train_y: &[f64],
    test_x: &[Vec<f64>],
    alpha: f64,
) -> Option<Vec<f64>> {
    let y_mean = stats::mean(train_y)?;
    let x = to_matrix(train_x, false);
    let p = x.ncols();
    let centered = DVector::from_iterator(train_y.len(), train_y.iter().map(|y| y - y_mean));

    let gram = x.transpose() * &x + DMatrix::<f64>::identity(p, p) * alpha;
    let weights = gram.cholesky()?.solve(&(x.transpose() * centered));

    let predictions = to_matrix(test_x, false) * weights;
    Some(predictions.iter().map(|v| v + y_mean).collect())
}

/// L2-penalized logistic regression (penalty `1 / (2C) * |w|^2`, intercept
/// unpenalized). Returns held-out probabilities and whether Newton converged.
fn logistic_predict(
    train_x: &[Vec<f64>],
    train_y: &[f64],
    test_x: &[Vec<f64>],
    c: f64,
    max_iter: usize,
) -> Option<(Vec<f64>, bool)> {
    let x = to_matrix(train_x, true);
    let y = DVector::from_column_slice(train_y);
    let xt = x.transpose();
    let p = x.ncols();

    let mut penalty = DMatrix::<f64>::identity(p, p) / c;
    penalty[(0, 0)] = 0.0;

    let mut beta = DVector::<f64>::zeros(p);
    let mut converged = false;
    for _ in 0..max_iter {
        let mu = probabilities(&x, &beta);
        let weights = mu.map(|m| m * (1.0 - m));
        let gradient = &xt * (&y - &mu) - &penalty * &beta;
        let hessian = &xt * DMatrix::from_diagonal(&weights) * &x + &penalty;
        let step = hessian.try_inverse()? * gradient;
        beta += &step;
        if step.amax() < 1e-6 {
            converged = true;
            break;
        }
    }

    let probs = probabilities(&to_matrix(test_x, true), &beta);
    Some((probs.iter().cloned().collect(), converged))
}

// =============================================================================
// CROSS-VALIDATION
// =============================================================================

/// Run k-fold cross-validation for `kind`.
pub fn cross_validate(kind: TargetKind, table: &FeatureTable, config: &EngineConfig) -> CrossValidation {
    let n = table.len();
    let k = config.cv_folds.min(n);
    if k < 2 {
        return CrossValidation::unavailable(kind, k, INSUFFICIENT_SAMPLES);
    }
    if kind == TargetKind::Binary {
        let positives = table.target.iter().filter(|y| **y >= 0.5).count();
        if positives == 0 || positives == n {
            return CrossValidation::unavailable(kind, k, SINGLE_CLASS);
        }
    }

    let mut cv = CrossValidation::empty(kind, k);
    let mut unconverged = 0;

    for (fold, test_idx) in kfold_indices(n, k, config.cv_seed).iter().enumerate() {
        let (train_x, train_y, test_x, test_y) = split(table, test_idx);
        let scaler = Standardizer::fit(&train_x);
        let train_x = scaler.transform(&train_x);
        let test_x = scaler.transform(&test_x);

        let scored = match kind {
            TargetKind::Continuous => {
                let Some(pred) = ridge_predict(&train_x, &train_y, &test_x, config.ridge_alpha) else {
                    cv.warnings.push(format!("fold {}: ridge system could not be solved", fold));
                    continue;
                };
                stats::r2_score(&test_y, &pred)
                    .zip(stats::rmse(&test_y, &pred))
                    .ok_or("zero target variance in test split; R² undefined")
            }
            TargetKind::Binary => {
                let train_pos = train_y.iter().filter(|y| **y >= 0.5).count();
                if train_pos == 0 || train_pos == train_y.len() {
                    cv.warnings
                        .push(format!("fold {}: training split has a single class", fold));
                    continue;
                }
                let Some((probs, converged)) = logistic_predict(
                    &train_x,
                    &train_y,
                    &test_x,
                    config.logistic_c,
                    config.cv_max_iter,
                ) else {
                    cv.warnings
                        .push(format!("fold {}: logistic system could not be solved", fold));
                    continue;
                };
                if !converged {
                    unconverged += 1;
                }
                stats::roc_auc(&test_y, &probs)
                    .zip(stats::accuracy(&test_y, &probs))
                    .ok_or("test split has a single class; ROC-AUC undefined")
            }
        };

        match scored {
            Ok((score, aux)) => {
                debug!("fold {}: {} = {:.4}, {} = {:.4}", fold, cv.scoring, score, cv.aux_metric, aux);
                cv.scores.push(score);
                cv.aux_scores.push(aux);
            }
            Err(reason) => cv.warnings.push(format!("fold {}: {}", fold, reason)),
        }
    }

    if unconverged > 0 {
        cv.warnings.push(format!(
            "logistic classifier did not converge in {} fold(s)",
            unconverged
        ));
    }
    if cv.scores.is_empty() {
        cv.warnings.push("No fold produced a valid score".to_string());
    } else {
        cv.mean_score = stats::mean(&cv.scores);
        cv.std_score = stats::population_std(&cv.scores);
        cv.aux_mean = stats::mean(&cv.aux_scores);
    }
    cv
}
