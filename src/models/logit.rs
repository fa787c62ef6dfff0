//! Maximum-likelihood logistic regression

use super::{finite, DesignMatrix, FitError, FittedModel, ModelDiagnostics};
use crate::claim::TargetKind;
use crate::stats::accuracy;
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};

const CONVERGENCE_TOL: f64 = 1e-8;
/// Fitted probabilities this close to every label mean the classes separate.
const SEPARATION_TOL: f64 = 1e-6;
/// Coefficient magnitude treated as divergence.
const DIVERGENCE_BOUND: f64 = 1e4;

pub(crate) fn sigmoid(eta: f64) -> f64 {
    1.0 / (1.0 + (-eta.clamp(-700.0, 700.0)).exp())
}

pub(crate) fn probabilities(x: &DMatrix<f64>, beta: &DVector<f64>) -> DVector<f64> {
    (x * beta).map(sigmoid)
}

/// Bernoulli log-likelihood with probabilities clipped away from 0 and 1.
fn log_likelihood(y: &DVector<f64>, mu: &DVector<f64>) -> f64 {
    y.iter()
        .zip(mu.iter())
        .map(|(yi, mi)| {
            let m = mi.clamp(1e-15, 1.0 - 1e-15);
            yi * m.ln() + (1.0 - yi) * (1.0 - m).ln()
        })
        .sum()
}

fn separated(y: &DVector<f64>, mu: &DVector<f64>) -> bool {
    y.iter().zip(mu.iter()).all(|(yi, mi)| (yi - mi).abs() < SEPARATION_TOL)
}

/// Fit by Newton-Raphson, at most `max_iter` iterations.
///
/// Iterates on the column-scaled design; the divergence bound applies to the
/// scaled coefficients. The response must already be 0/1.
pub fn fit(design: &DesignMatrix, max_iter: usize) -> Result<FittedModel, FitError> {
    let n_pos = design.y.iter().filter(|v| **v >= 0.5).count();
    if n_pos == 0 || n_pos == design.n_obs() {
        return Err(FitError::PerfectSeparation);
    }
    let scaled = design.check_identifiable()?;

    let x = &scaled.x;
    let y = design.y.map(|v| if v >= 0.5 { 1.0 } else { 0.0 });
    let xt = x.transpose();
    let p = design.n_params();

    let mut beta = DVector::<f64>::zeros(p);
    let mut converged = false;
    for iteration in 0..max_iter {
        let mu = probabilities(x, &beta);
        let weights = mu.map(|m| m * (1.0 - m));
        let gradient = &xt * (&y - &mu);
        let hessian = &xt * DMatrix::from_diagonal(&weights) * x;
        let step = hessian
            .cholesky()
            .ok_or(FitError::SingularMatrix)?
            .solve(&gradient);

        beta += &step;

        if beta.iter().any(|b| !b.is_finite() || b.abs() > DIVERGENCE_BOUND) {
            return Err(FitError::PerfectSeparation);
        }
        if separated(&y, &probabilities(x, &beta)) {
            return Err(FitError::PerfectSeparation);
        }
        if step.amax() < CONVERGENCE_TOL {
            tracing::debug!("logit converged after {} iterations", iteration + 1);
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(FitError::NonConvergence {
            iterations: max_iter,
        });
    }

    let mu = probabilities(x, &beta);
    let weights = mu.map(|m| m * (1.0 - m));
    let covariance = scaled.unscale_covariance(
        &(&xt * DMatrix::from_diagonal(&weights) * x)
            .cholesky()
            .ok_or(FitError::SingularMatrix)?
            .inverse(),
    );
    let beta = scaled.unscale(&beta);

    let n = design.n_obs() as f64;
    let k = p as f64;
    let llf = log_likelihood(&y, &mu);
    let share = n_pos as f64 / n;
    let llnull = n * (share * share.ln() + (1.0 - share) * (1.0 - share).ln());
    let pseudo_r_squared = 1.0 - llf / llnull;

    let normal = Normal::new(0.0, 1.0).map_err(|_| FitError::SingularMatrix)?;
    let z_crit = normal.inverse_cdf(0.975);
    let mut std_errors = Vec::with_capacity(p);
    let mut p_values = Vec::with_capacity(p);
    let mut conf_int = Vec::with_capacity(p);
    for (j, b) in beta.iter().enumerate() {
        let se = covariance[(j, j)].sqrt();
        let p_value = (se > 0.0).then(|| 2.0 * (1.0 - normal.cdf((b / se).abs())));
        std_errors.push(se);
        p_values.push(p_value);
        conf_int.push((b - z_crit * se, b + z_crit * se));
    }

    let labels: Vec<f64> = y.iter().cloned().collect();
    let fitted: Vec<f64> = mu.iter().cloned().collect();

    let mut diagnostics = ModelDiagnostics::bare(TargetKind::Binary);
    diagnostics.pseudo_r_squared = finite(pseudo_r_squared);
    diagnostics.log_likelihood = finite(llf);
    diagnostics.aic = finite(-2.0 * llf + 2.0 * k);
    diagnostics.bic = finite(-2.0 * llf + k * n.ln());
    diagnostics.accuracy = accuracy(&labels, &fitted);

    Ok(FittedModel {
        parameter_names: design.names.clone(),
        params: beta.iter().cloned().collect(),
        std_errors,
        p_values,
        conf_int,
        diagnostics,
    })
}
