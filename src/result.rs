//! Result Assembler
//!
//! The persisted output of one claim evaluation. Terminal data-availability
//! states (`no_data`, `missing_columns`, `insufficient_sample`) produce a
//! valid record with an empty model summary.

use crate::claim::Claim;
use crate::effects::EffectAnalysis;
use crate::models::{Coefficient, ModelDiagnostics};
use crate::portable::to_portable_value;
use crate::validation::CrossValidation;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Ok,
    NoData,
    MissingColumns,
    InsufficientSample,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NoData => "no_data",
            Self::MissingColumns => "missing_columns",
            Self::InsufficientSample => "insufficient_sample",
        }
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostics merged with the nested cross-validation block.
/// Serializes as `{}` when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    #[serde(flatten)]
    pub diagnostics: Option<ModelDiagnostics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_validation: Option<CrossValidation>,
}

impl ModelSummary {
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_none() && self.cross_validation.is_none()
    }
}

/// One evaluated claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResult {
    pub claim: Claim,
    pub status: ClaimStatus,
    pub sample_size: usize,
    pub model_summary: ModelSummary,
    pub coefficients: Vec<Coefficient>,
    pub effect_analysis: Option<EffectAnalysis>,
    pub warnings: Vec<String>,
    /// RFC 3339 UTC time of assembly.
    pub timestamp: String,
}

impl ClaimResult {
    /// Record for a terminal state reached before modeling.
    pub fn terminal(
        claim: &Claim,
        status: ClaimStatus,
        sample_size: usize,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            claim: claim.clone(),
            status,
            sample_size,
            model_summary: ModelSummary::default(),
            coefficients: Vec::new(),
            effect_analysis: None,
            warnings,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Record for a fully evaluated claim.
    pub fn completed(
        claim: &Claim,
        sample_size: usize,
        model_summary: ModelSummary,
        coefficients: Vec<Coefficient>,
        effect_analysis: EffectAnalysis,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            claim: claim.clone(),
            status: ClaimStatus::Ok,
            sample_size,
            model_summary,
            coefficients,
            effect_analysis: Some(effect_analysis),
            warnings,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn to_portable_json(&self) -> serde_json::Result<serde_json::Value> {
        to_portable_value(self)
    }

    /// Condensed record for batch `summary.json` files.
    pub fn summary_entry(&self) -> SummaryEntry {
        let mut model_metrics = serde_json::Map::new();
        let mut primary_metric = None;

        if let Some(d) = &self.model_summary.diagnostics {
            primary_metric = Some(d.primary_metric.clone());
            let metrics = [
                ("r_squared", d.r_squared),
                ("adj_r_squared", d.adj_r_squared),
                ("pseudo_r_squared", d.pseudo_r_squared),
                ("aic", d.aic),
                ("bic", d.bic),
                ("rmse", d.rmse),
                ("log_likelihood", d.log_likelihood),
                ("accuracy", d.accuracy),
            ];
            for (name, value) in metrics {
                if let Some(v) = value {
                    model_metrics.insert(name.to_string(), serde_json::json!(v));
                }
            }
        }
        if let Some(cv) = &self.model_summary.cross_validation {
            model_metrics.insert(
                format!("cv_{}_mean", cv.scoring),
                serde_json::json!(cv.mean_score),
            );
        }

        SummaryEntry {
            claim_id: self.claim.claim_id.clone(),
            status: self.status,
            sample_size: self.sample_size,
            primary_metric,
            model_metrics,
            warnings: self.warnings.clone(),
        }
    }
}

/// One row of a batch summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub claim_id: String,
    pub status: ClaimStatus,
    pub sample_size: usize,
    pub primary_metric: Option<String>,
    pub model_metrics: serde_json::Map<String, serde_json::Value>,
    pub warnings: Vec<String>,
}
