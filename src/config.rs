//! Engine configuration
//!
//! Tunables for the cross-validator, the model fitters and the effect
//! analyzer. Every field has a serde default so a partial TOML file is valid.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Proof engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Requested k for k-fold cross-validation (capped at the sample size)
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,

    /// Seed for the fold shuffle
    #[serde(default = "default_cv_seed")]
    pub cv_seed: u64,

    /// Ridge penalty for continuous cross-validation
    #[serde(default = "default_ridge_alpha")]
    pub ridge_alpha: f64,

    /// Inverse regularization strength for binary cross-validation
    #[serde(default = "default_logistic_c")]
    pub logistic_c: f64,

    /// Newton iteration cap for the diagnostic logistic fit
    #[serde(default = "default_logit_max_iter")]
    pub logit_max_iter: usize,

    /// Newton iteration cap for the regularized logistic classifier
    #[serde(default = "default_cv_max_iter")]
    pub cv_max_iter: usize,

    /// Minimum paired observations before a correlation is reported
    #[serde(default = "default_min_correlation_pairs")]
    pub min_correlation_pairs: usize,
}

fn default_cv_folds() -> usize {
    5
}

fn default_cv_seed() -> u64 {
    42
}

fn default_ridge_alpha() -> f64 {
    1.0
}

fn default_logistic_c() -> f64 {
    1.0
}

fn default_logit_max_iter() -> usize {
    200
}

fn default_cv_max_iter() -> usize {
    100
}

fn default_min_correlation_pairs() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cv_folds: default_cv_folds(),
            cv_seed: default_cv_seed(),
            ridge_alpha: default_ridge_alpha(),
            logistic_c: default_logistic_c(),
            logit_max_iter: default_logit_max_iter(),
            cv_max_iter: default_cv_max_iter(),
            min_correlation_pairs: default_min_correlation_pairs(),
        }
    }
}

impl EngineConfig {
    /// Load from TOML file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load from `PROOF_ENGINE_CONFIG` or fall back to defaults.
    ///
    /// Only the batch driver calls this; the engine never reads the environment.
    pub fn from_env() -> Self {
        let path = std::env::var("PROOF_ENGINE_CONFIG")
            .unwrap_or_else(|_| "proof_engine.toml".to_string());

        Self::load(&path).unwrap_or_else(|e| {
            tracing::debug!("Using default engine config ({}): {}", path, e);
            Self::default()
        })
    }

    /// Save to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
