//! Model Fitters
//!
//! In-sample diagnostic fits: ordinary least squares for continuous targets
//! and maximum-likelihood logistic regression for binary targets. Both return
//! `Result<FittedModel, FitError>`; the orchestrator turns an `Err` into a
//! warning-only diagnostics record and keeps going.

pub mod logit;
pub mod ols;

use crate::claim::TargetKind;
use crate::dataset::Dataset;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Name of the intercept parameter.
pub const INTERCEPT: &str = "const";

/// Smallest singular value ratio of the column-scaled design accepted before
/// it counts as rank deficient.
pub(crate) const RANK_TOLERANCE: f64 = 1e-10;

// =============================================================================
// FIT ERRORS
// =============================================================================

/// Closed set of soft fitting failures.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// Design matrix is rank deficient (collinear or constant columns).
    SingularMatrix,
    /// Classes are linearly separable; ML estimates diverge.
    PerfectSeparation,
    NonConvergence { iterations: usize },
    /// Fewer rows than parameters.
    InsufficientData { rows: usize, params: usize },
    /// A model column holds values that cannot be cast to float.
    NonNumericColumn(String),
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingularMatrix => write!(f, "Singular matrix: design matrix is rank deficient"),
            Self::PerfectSeparation => {
                write!(f, "Perfect separation detected; logistic estimates diverge")
            }
            Self::NonConvergence { iterations } => {
                write!(f, "Model failed to converge after {} iterations", iterations)
            }
            Self::InsufficientData { rows, params } => write!(
                f,
                "Insufficient data: {} rows for {} parameters",
                rows, params
            ),
            Self::NonNumericColumn(name) => {
                write!(f, "Column '{}' cannot be cast to float", name)
            }
        }
    }
}

impl std::error::Error for FitError {}

// =============================================================================
// DIAGNOSTICS & COEFFICIENTS
// =============================================================================

/// In-sample fit diagnostics. Metrics that do not apply to the model family
/// are omitted from the serialized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDiagnostics {
    pub model_type: String,
    pub primary_metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adj_r_squared: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pseudo_r_squared: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rmse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_likelihood: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ModelDiagnostics {
    fn bare(kind: TargetKind) -> Self {
        let (model_type, primary_metric) = match kind {
            TargetKind::Continuous => ("ols", "r_squared"),
            TargetKind::Binary => ("logit", "pseudo_r_squared"),
        };
        Self {
            model_type: model_type.to_string(),
            primary_metric: primary_metric.to_string(),
            r_squared: None,
            adj_r_squared: None,
            pseudo_r_squared: None,
            aic: None,
            bic: None,
            rmse: None,
            log_likelihood: None,
            accuracy: None,
            warnings: Vec::new(),
        }
    }

    /// Record carrying only the model identity and the failure reason.
    pub fn failed(kind: TargetKind, error: &FitError) -> Self {
        let mut diagnostics = Self::bare(kind);
        diagnostics.warnings.push(error.to_string());
        diagnostics
    }

    /// Value of the metric named by `primary_metric`.
    pub fn primary_value(&self) -> Option<f64> {
        match self.primary_metric.as_str() {
            "r_squared" => self.r_squared,
            "pseudo_r_squared" => self.pseudo_r_squared,
            _ => None,
        }
    }
}

/// One extracted model parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: Option<f64>,
    pub p_value: Option<f64>,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
}

/// Fitted model: parameter estimates plus diagnostics.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub parameter_names: Vec<String>,
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub p_values: Vec<Option<f64>>,
    pub conf_int: Vec<(f64, f64)>,
    pub diagnostics: ModelDiagnostics,
}

impl FittedModel {
    pub fn coefficients(&self) -> Vec<Coefficient> {
        self.parameter_names
            .iter()
            .enumerate()
            .map(|(i, name)| Coefficient {
                name: name.clone(),
                estimate: self.params[i],
                std_error: finite(self.std_errors[i]),
                p_value: self.p_values[i].and_then(finite),
                ci_lower: finite(self.conf_int[i].0),
                ci_upper: finite(self.conf_int[i].1),
            })
            .collect()
    }
}

pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

// =============================================================================
// FEATURE TABLE / DESIGN MATRIX
// =============================================================================

/// Complete numeric feature rows and target, cast to float.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub target: Vec<f64>,
}

impl FeatureTable {
    /// Extract `features` and `target` from a dataset with no missing cells.
    pub fn from_dataset(
        dataset: &Dataset,
        features: &[String],
        target: &str,
    ) -> Result<Self, FitError> {
        let mut columns = Vec::with_capacity(features.len());
        for name in features {
            columns.push(numeric(dataset, name)?);
        }
        let target_values = numeric(dataset, target)?;

        let rows = (0..dataset.len())
            .map(|i| columns.iter().map(|col| col[i]).collect())
            .collect();

        Ok(Self {
            feature_names: features.to_vec(),
            rows,
            target: target_values,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Design matrix with the intercept column prepended.
    pub fn design(&self) -> DesignMatrix {
        let n = self.rows.len();
        let p = self.feature_names.len() + 1;
        let x = DMatrix::from_fn(n, p, |i, j| if j == 0 { 1.0 } else { self.rows[i][j - 1] });
        let mut names = Vec::with_capacity(p);
        names.push(INTERCEPT.to_string());
        names.extend(self.feature_names.iter().cloned());
        DesignMatrix {
            names,
            x,
            y: DVector::from_column_slice(&self.target),
        }
    }
}

fn numeric(dataset: &Dataset, name: &str) -> Result<Vec<f64>, FitError> {
    dataset
        .numeric_column(name)
        .and_then(|col| col.into_iter().collect::<Option<Vec<f64>>>())
        .ok_or_else(|| FitError::NonNumericColumn(name.to_string()))
}

/// Intercept-first design matrix and response vector.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub names: Vec<String>,
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
}

impl DesignMatrix {
    pub fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_params(&self) -> usize {
        self.x.ncols()
    }

    /// Copy of the design with every column divided by its root mean square.
    /// All-zero columns keep a unit scale.
    pub(crate) fn scaled(&self) -> ScaledDesign {
        let n = self.n_obs().max(1) as f64;
        let scales = DVector::from_iterator(
            self.n_params(),
            self.x.column_iter().map(|col| {
                let rms = (col.norm_squared() / n).sqrt();
                if rms > 0.0 && rms.is_finite() {
                    rms
                } else {
                    1.0
                }
            }),
        );
        let x = DMatrix::from_fn(self.n_obs(), self.n_params(), |i, j| {
            self.x[(i, j)] / scales[j]
        });
        ScaledDesign { x, scales }
    }

    /// Reject designs with fewer rows than parameters or a rank deficiency.
    ///
    /// Rank is judged on the scaled design so raw magnitudes (market caps,
    /// sale prices) do not read as collinearity.
    pub(crate) fn check_identifiable(&self) -> Result<ScaledDesign, FitError> {
        let (n, p) = (self.n_obs(), self.n_params());
        if n <= p {
            return Err(FitError::InsufficientData { rows: n, params: p });
        }
        let scaled = self.scaled();
        let svd = scaled.x.clone().svd(false, false);
        let max = svd.singular_values.iter().cloned().fold(0.0, f64::max);
        let min = svd
            .singular_values
            .iter()
            .cloned()
            .fold(f64::INFINITY, f64::min);
        if max <= 0.0 || !max.is_finite() || !min.is_finite() || min / max < RANK_TOLERANCE {
            return Err(FitError::SingularMatrix);
        }
        Ok(scaled)
    }
}

/// Design matrix with unit-RMS columns. Fitters work in this space and map
/// estimates back with [`ScaledDesign::unscale`].
#[derive(Debug, Clone)]
pub(crate) struct ScaledDesign {
    pub x: DMatrix<f64>,
    pub scales: DVector<f64>,
}

impl ScaledDesign {
    /// Coefficients on scaled columns to coefficients on raw columns.
    pub fn unscale(&self, beta: &DVector<f64>) -> DVector<f64> {
        beta.component_div(&self.scales)
    }

    /// Covariance on scaled columns to covariance on raw columns.
    pub fn unscale_covariance(&self, cov: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(cov.nrows(), cov.ncols(), |i, j| {
            cov[(i, j)] / (self.scales[i] * self.scales[j])
        })
    }
}

/// Fit the diagnostic model for `kind`.
pub fn fit(
    kind: TargetKind,
    table: &FeatureTable,
    logit_max_iter: usize,
) -> Result<FittedModel, FitError> {
    let design = table.design();
    match kind {
        TargetKind::Continuous => ols::fit(&design),
        TargetKind::Binary => logit::fit(&design, logit_max_iter),
    }
}
