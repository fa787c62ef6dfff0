//! Statistics kernel
//!
//! Small numeric helpers shared by the fitters, the cross-validator and the
//! effect analyzer. Everything works on plain `f64` slices; degenerate inputs
//! (empty, zero variance) return `None` rather than NaN.

use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().std_dev())
}

/// Population standard deviation (n denominator).
pub fn population_std(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().population_std_dev())
}

/// Pearson correlation with its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Pearson r between paired samples, p-value from Student-t with n - 2 df.
///
/// Returns `None` with fewer than three pairs or when either side is
/// constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<Correlation> {
    let n = x.len().min(y.len());
    if n < 3 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let x_mean = x.iter().mean();
    let y_mean = y.iter().mean();

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }

    let r = (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0);
    let df = (n - 2) as f64;
    let p_value = if (1.0 - r.abs()) < 1e-12 {
        0.0
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        two_sided_t_p_value(t, df)?
    };

    Some(Correlation { r, p_value, n })
}

/// Two-sided p-value for a t statistic.
pub fn two_sided_t_p_value(t: f64, df: f64) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// Student-t quantile for a two-sided interval at `confidence`.
pub fn t_critical(confidence: f64, df: f64) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some(dist.inverse_cdf(0.5 + confidence / 2.0))
}

// =============================================================================
// STANDARDIZATION
// =============================================================================

/// Per-column centering and scaling fitted on a training split.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl Standardizer {
    /// Fit on row-major data. Constant columns get scale 1.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, |r| r.len());
        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);
        for j in 0..width {
            let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
            let m = mean(&column).unwrap_or(0.0);
            let s = population_std(&column).unwrap_or(0.0);
            means.push(m);
            scales.push(if s > f64::EPSILON { s } else { 1.0 });
        }
        Self { means, scales }
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(x, (m, s))| (x - m) / s)
                    .collect()
            })
            .collect()
    }
}

// =============================================================================
// SCORING
// =============================================================================

/// Coefficient of determination; `None` when `y_true` has zero variance.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    let m = mean(y_true)?;
    let ss_tot: f64 = y_true.iter().map(|y| (y - m).powi(2)).sum();
    if ss_tot <= f64::EPSILON {
        return None;
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    Some(1.0 - ss_res / ss_tot)
}

pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> Option<f64> {
    if y_true.is_empty() {
        return None;
    }
    let mse = y_true
        .iter()
        .zip(y_pred)
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64;
    Some(mse.sqrt())
}

/// Share of labels matched by `probabilities >= 0.5`.
pub fn accuracy(labels: &[f64], probabilities: &[f64]) -> Option<f64> {
    if labels.is_empty() {
        return None;
    }
    let hits = labels
        .iter()
        .zip(probabilities)
        .filter(|(y, p)| (**p >= 0.5) == (**y >= 0.5))
        .count();
    Some(hits as f64 / labels.len() as f64)
}

/// ROC-AUC via the Mann-Whitney rank statistic, ties get average ranks.
///
/// `None` unless both classes are present.
pub fn roc_auc(labels: &[f64], scores: &[f64]) -> Option<f64> {
    let n = labels.len().min(scores.len());
    let n_pos = labels[..n].iter().filter(|y| **y >= 0.5).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based; a tie block shares the mean of its positions
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = (0..n).filter(|&i| labels[i] >= 0.5).map(|i| ranks[i]).sum();
    let u = pos_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Some(u / (n_pos * n_neg) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        let c = pearson(&x, &y).unwrap();
        assert!((c.r - 1.0).abs() < 1e-12);
        assert_eq!(c.p_value, 0.0);

        let y_neg: Vec<f64> = y.iter().map(|v| -v).collect();
        assert!((pearson(&x, &y_neg).unwrap().r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_known_p_value() {
        // r = 76.5 / 82.5 ~= 0.927, t ~= 7.0 with 8 df
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let y = [2.0, 1.0, 4.0, 3.0, 7.0, 5.0, 6.0, 9.0, 8.0, 10.0];
        let c = pearson(&x, &y).unwrap();
        assert!(c.r > 0.85 && c.r < 0.95, "r = {}", c.r);
        assert!(c.p_value < 0.01);
        assert_eq!(c.n, 10);
    }

    #[test]
    fn test_pearson_constant_is_none() {
        assert!(pearson(&[1.0, 1.0, 1.0, 1.0], &[1.0, 2.0, 3.0, 4.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_t_critical_large_df_approaches_normal() {
        let t = t_critical(0.95, 10_000.0).unwrap();
        assert!((t - 1.96).abs() < 0.01);
    }

    #[test]
    fn test_standardizer_constant_column_scale_one() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let s = Standardizer::fit(&rows);
        let t = s.transform(&rows);
        assert_eq!(t, vec![vec![-1.0, 0.0], vec![1.0, 0.0]]);
    }

    #[test]
    fn test_roc_auc_with_ties() {
        let labels = [0.0, 0.0, 1.0, 1.0];
        assert_eq!(roc_auc(&labels, &[0.1, 0.4, 0.35, 0.8]), Some(0.75));
        assert_eq!(roc_auc(&labels, &[0.5, 0.5, 0.5, 0.5]), Some(0.5));
        assert_eq!(roc_auc(&[1.0, 1.0], &[0.2, 0.9]), None);
    }

    #[test]
    fn test_r2_and_rmse() {
        let y = [1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &y), Some(1.0));
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 3.0]), None);
        assert_eq!(rmse(&[0.0, 0.0], &[3.0, 4.0]), Some((12.5f64).sqrt()));
    }

    #[test]
    fn test_accuracy_threshold() {
        assert_eq!(accuracy(&[1.0, 0.0, 1.0, 0.0], &[0.5, 0.49, 0.2, 0.9]), Some(0.5));
    }
}
