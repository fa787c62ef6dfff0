//! Ordinary least squares

use super::{finite, DesignMatrix, FitError, FittedModel, ModelDiagnostics};
use crate::claim::TargetKind;
use crate::stats::{t_critical, two_sided_t_p_value};
use nalgebra::DMatrix;
use std::f64::consts::PI;

/// Fit `y = X b` by least squares.
///
/// Solved through the SVD of the column-scaled design; `(X'X)^-1` for the
/// standard errors comes from the same decomposition.
///
/// Diagnostics follow the Gaussian likelihood with k = number of parameters
/// (intercept included). RMSE is the residual standard error,
/// `sqrt(SSR / df_resid)`.
pub fn fit(design: &DesignMatrix) -> Result<FittedModel, FitError> {
    let scaled = design.check_identifiable()?;

    let y = &design.y;
    let n = design.n_obs() as f64;
    let p = design.n_params() as f64;

    let svd = scaled.x.clone().svd(true, true);
    let beta_scaled = svd.solve(y, 0.0).map_err(|_| FitError::SingularMatrix)?;
    let v_t = svd.v_t.as_ref().ok_or(FitError::SingularMatrix)?;
    let inv_sq = svd.singular_values.map(|s| 1.0 / (s * s));
    let xtx_inv_scaled = v_t.transpose() * DMatrix::from_diagonal(&inv_sq) * v_t;

    let beta = scaled.unscale(&beta_scaled);
    let xtx_inv = scaled.unscale_covariance(&xtx_inv_scaled);

    let residuals = y - &scaled.x * &beta_scaled;
    let ssr = residuals.dot(&residuals);
    let y_mean = y.mean();
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();

    let df_resid = n - p;
    let df_total = n - 1.0;
    let sigma2 = ssr / df_resid;

    let r_squared = if tss > f64::EPSILON {
        Some(1.0 - ssr / tss)
    } else {
        None
    };
    let adj_r_squared = r_squared.map(|r2| 1.0 - (1.0 - r2) * df_total / df_resid);

    let log_likelihood = -n / 2.0 * ((2.0 * PI).ln() + (ssr / n).ln() + 1.0);
    let aic = -2.0 * log_likelihood + 2.0 * p;
    let bic = -2.0 * log_likelihood + p * n.ln();

    let crit = t_critical(0.95, df_resid).unwrap_or(f64::NAN);
    let mut std_errors = Vec::with_capacity(beta.len());
    let mut p_values = Vec::with_capacity(beta.len());
    let mut conf_int = Vec::with_capacity(beta.len());
    for (j, b) in beta.iter().enumerate() {
        let se = (sigma2 * xtx_inv[(j, j)]).sqrt();
        let p_value = if se > 0.0 {
            two_sided_t_p_value(b / se, df_resid)
        } else {
            None
        };
        std_errors.push(se);
        p_values.push(p_value);
        conf_int.push((b - crit * se, b + crit * se));
    }

    let mut diagnostics = ModelDiagnostics::bare(TargetKind::Continuous);
    diagnostics.r_squared = r_squared.and_then(finite);
    diagnostics.adj_r_squared = adj_r_squared.and_then(finite);
    diagnostics.aic = finite(aic);
    diagnostics.bic = finite(bic);
    diagnostics.rmse = finite(sigma2.sqrt());

    Ok(FittedModel {
        parameter_names: design.names.clone(),
        params: beta.iter().cloned().collect(),
        std_errors,
        p_values,
        conf_int,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::models::FeatureTable;

    fn table(rows: Vec<(f64, f64, f64)>) -> FeatureTable {
        let ds = Dataset::from_rows(
            &["x1", "x2", "y"],
            rows.into_iter()
                .map(|(a, b, y)| vec![a.into(), b.into(), y.into()])
                .collect(),
        );
        FeatureTable::from_dataset(&ds, &["x1".into(), "x2".into()], "y").unwrap()
    }

    #[test]
    fn test_recovers_known_coefficients() {
        // y = 1 + 2*x1 - 0.5*x2 + small deterministic wobble
        let rows = (0..40)
            .map(|i| {
                let x1 = i as f64 * 0.25;
                let x2 = ((i * 7) % 11) as f64;
                let wobble = if i % 2 == 0 { 0.05 } else { -0.05 };
                (x1, x2, 1.0 + 2.0 * x1 - 0.5 * x2 + wobble)
            })
            .collect();
        let model = fit(&table(rows).design()).unwrap();

        assert_eq!(model.parameter_names, vec!["const", "x1", "x2"]);
        assert!((model.params[0] - 1.0).abs() < 0.05);
        assert!((model.params[1] - 2.0).abs() < 0.01);
        assert!((model.params[2] + 0.5).abs() < 0.01);

        let d = &model.diagnostics;
        assert!(d.r_squared.unwrap() > 0.999);
        assert!(d.adj_r_squared.unwrap() <= d.r_squared.unwrap());
        assert!(d.rmse.unwrap() < 0.1);
        assert!(d.aic.unwrap() < d.bic.unwrap());

        let coefs = model.coefficients();
        assert!(coefs[1].p_value.unwrap() < 1e-6);
        assert!(coefs[1].ci_lower.unwrap() < 2.0 && coefs[1].ci_upper.unwrap() > 2.0);
    }

    #[test]
    fn test_raw_market_cap_scale_recovers_slope() {
        // y = 2 + 3e-9 * cap, cap spanning 1e6..1e10
        let ds = Dataset::from_rows(
            &["market_cap", "y"],
            (0..120)
                .map(|i| {
                    let cap = 1.0e6 + i as f64 * (1.0e10 - 1.0e6) / 119.0;
                    let wobble = if i % 2 == 0 { 0.3 } else { -0.3 };
                    vec![cap.into(), (2.0 + 3.0e-9 * cap + wobble).into()]
                })
                .collect(),
        );
        let table = FeatureTable::from_dataset(&ds, &["market_cap".into()], "y").unwrap();
        let model = fit(&table.design()).unwrap();

        assert!((model.params[0] - 2.0).abs() < 0.2);
        assert!((model.params[1] - 3.0e-9).abs() < 1.0e-10);
        assert!(model.diagnostics.r_squared.unwrap() > 0.99);
        let slope = &model.coefficients()[1];
        assert!(slope.std_error.unwrap() > 0.0);
        assert!(slope.p_value.unwrap() < 1e-6);
        assert!(slope.ci_lower.unwrap() < 3.0e-9 && slope.ci_upper.unwrap() > 3.0e-9);
    }

    #[test]
    fn test_collinear_columns_are_singular() {
        let rows = (0..20).map(|i| (i as f64, 2.0 * i as f64, i as f64 + 3.0)).collect();
        assert_eq!(fit(&table(rows).design()).unwrap_err(), FitError::SingularMatrix);
    }

    #[test]
    fn test_constant_column_is_singular() {
        let rows = (0..20).map(|i| (i as f64, 1.0, (i % 3) as f64)).collect();
        assert_eq!(fit(&table(rows).design()).unwrap_err(), FitError::SingularMatrix);
    }

    #[test]
    fn test_too_few_rows() {
        let rows = vec![(1.0, 2.0, 3.0), (2.0, 1.0, 4.0), (3.0, 5.0, 1.0)];
        assert_eq!(
            fit(&table(rows).design()).unwrap_err(),
            FitError::InsufficientData { rows: 3, params: 3 }
        );
    }
}
