//! Proof Engine
//!
//! Turns one claim into one result record:
//!
//! ```text
//! assemble ─▶ filter ─▶ column check ─▶ drop missing ─▶ sample floor
//!                                                            │
//!      persist ◀─ result ◀─ effects ◀─ cross-validate ◀─ fit ┘
//! ```
//!
//! Data-availability problems end the pipeline early with a terminal status.
//! Statistical degeneracy (singular designs, separation, single-class folds)
//! is downgraded to warnings inside the result. Only store and filesystem
//! failures surface as `Err`.

use crate::assemblers::assembler_for;
use crate::claim::Claim;
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::effects;
use crate::error::{EngineError, EngineResult};
use crate::filter::apply_filters;
use crate::models::{self, FeatureTable, ModelDiagnostics};
use crate::persist::ResultPersister;
use crate::result::{ClaimResult, ClaimStatus, ModelSummary};
use crate::store::EntityStore;
use crate::validation::{self, CrossValidation};
use tracing::{debug, info, warn};

pub struct ProofEngine {
    store: EntityStore,
    config: EngineConfig,
    persister: Option<ResultPersister>,
}

impl ProofEngine {
    pub fn new(store: EntityStore, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            persister: None,
        }
    }

    /// Enable `persist = true` runs, writing into `persister`'s directory.
    pub fn with_persister(mut self, persister: ResultPersister) -> Self {
        self.persister = Some(persister);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn persister(&self) -> Option<&ResultPersister> {
        self.persister.as_ref()
    }

    /// Evaluate a claim end to end.
    ///
    /// Always returns a result for data or statistical problems; errors only
    /// come from the store, from persistence, or from asking to persist
    /// without a configured persister.
    pub fn run_claim(&self, claim: &Claim, persist: bool) -> EngineResult<ClaimResult> {
        info!(
            "Running claim {} ({} / {})",
            claim.claim_id, claim.asset_type, claim.target_kind.as_str()
        );

        let dataset = self.assemble(claim)?;
        let result = self.evaluate_dataset(claim, &dataset);

        info!(
            "Claim {} finished: status={} sample_size={}",
            claim.claim_id, result.status, result.sample_size
        );

        if persist {
            let persister = self.persister.as_ref().ok_or_else(|| {
                EngineError::Config(format!(
                    "claim {} asked to persist but no output directory is configured",
                    claim.claim_id
                ))
            })?;
            persister.persist(&result)?;
        }
        Ok(result)
    }

    /// Evaluate a claim given as a JSON mapping.
    pub fn run_value(&self, value: &serde_json::Value, persist: bool) -> EngineResult<ClaimResult> {
        let claim = Claim::from_value(value)?;
        self.run_claim(&claim, persist)
    }

    /// Build the claim's dataset from the store.
    pub fn assemble(&self, claim: &Claim) -> EngineResult<Dataset> {
        let assembler = assembler_for(claim.asset_type);
        self.store
            .with_connection(|conn| assembler.assemble(conn, claim))
    }

    /// Evaluate a claim against an already assembled dataset.
    pub fn evaluate_dataset(&self, claim: &Claim, dataset: &Dataset) -> ClaimResult {
        if dataset.is_empty() {
            info!("Claim {}: no rows assembled", claim.claim_id);
            return ClaimResult::terminal(claim, ClaimStatus::NoData, 0, Vec::new());
        }

        let filtered = apply_filters(dataset, &claim.filters);

        let required = claim.required_columns();
        let missing = filtered.dataset.missing_columns(&required);
        if !missing.is_empty() {
            warn!("Claim {}: missing columns {:?}", claim.claim_id, missing);
            return ClaimResult::terminal(
                claim,
                ClaimStatus::MissingColumns,
                0,
                vec![format!("Missing columns: {}", missing.join(", "))],
            );
        }

        let complete = filtered.dataset.select(&required).drop_missing();
        let sample_size = complete.len();
        debug!(
            "Claim {}: {} rows after filters, {} complete",
            claim.claim_id,
            filtered.dataset.len(),
            sample_size
        );

        if sample_size < claim.sample_floor {
            info!(
                "Claim {}: sample {} below floor {}",
                claim.claim_id, sample_size, claim.sample_floor
            );
            return ClaimResult::terminal(
                claim,
                ClaimStatus::InsufficientSample,
                sample_size,
                Vec::new(),
            );
        }

        let features = claim.all_features();
        let (diagnostics, coefficients, cross_validation) =
            match FeatureTable::from_dataset(&complete, &features, &claim.target_column) {
                Ok(table) => self.fit_and_validate(claim, &table),
                Err(e) => {
                    warn!("Claim {}: {}", claim.claim_id, e);
                    (
                        ModelDiagnostics::failed(claim.target_kind, &e),
                        Vec::new(),
                        CrossValidation::unavailable(claim.target_kind, 0, &e.to_string()),
                    )
                }
            };

        let effect_analysis =
            effects::analyze(claim, &complete, self.config.min_correlation_pairs);
        let warnings = diagnostics.warnings.clone();

        ClaimResult::completed(
            claim,
            sample_size,
            ModelSummary {
                diagnostics: Some(diagnostics),
                cross_validation: Some(cross_validation),
            },
            coefficients,
            effect_analysis,
            warnings,
        )
    }

    fn fit_and_validate(
        &self,
        claim: &Claim,
        table: &FeatureTable,
    ) -> (ModelDiagnostics, Vec<models::Coefficient>, CrossValidation) {
        let (diagnostics, coefficients) =
            match models::fit(claim.target_kind, table, self.config.logit_max_iter) {
                Ok(model) => {
                    debug!(
                        "Claim {}: {} = {:?}",
                        claim.claim_id,
                        model.diagnostics.primary_metric,
                        model.diagnostics.primary_value()
                    );
                    let coefficients = model.coefficients();
                    (model.diagnostics, coefficients)
                }
                Err(e) => {
                    warn!("Claim {}: model fit failed: {}", claim.claim_id, e);
                    (ModelDiagnostics::failed(claim.target_kind, &e), Vec::new())
                }
            };

        let cross_validation = validation::cross_validate(claim.target_kind, table, &self.config);
        for w in &cross_validation.warnings {
            debug!("Claim {}: cross-validation: {}", claim.claim_id, w);
        }
        (diagnostics, coefficients, cross_validation)
    }
}
