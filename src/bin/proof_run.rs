//! Proof Runner CLI
//!
//! Batch driver: loads a claim file, evaluates every claim against an entity
//! store and writes per-claim results plus a `summary.json` into a fresh
//! timestamped directory.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin proof_run -- \
//!   --db ./entities.db \
//!   --claims ./claims.toml \
//!   --output-dir ./proof_results \
//!   --parallel
//! ```
//!
//! # Exit Codes
//!
//! - 0: every claim produced a result (whatever its status)
//! - 1: configuration error, or at least one claim failed on store/filesystem I/O

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use regressive_proof::{
    Claim, ClaimResult, ClaimSet, EngineConfig, EngineResult, EntityStore, ProofEngine,
    ResultPersister,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "proof_run=info,regressive_proof=info";

/// Evaluate nominative-determinism claims against an entity store
#[derive(Parser, Debug)]
#[command(name = "proof_run")]
#[command(about = "Run declarative claims through the regressive proof engine")]
struct Args {
    /// Path to the SQLite entity store
    #[arg(long, env = "PROOF_ENGINE_DB")]
    db: PathBuf,

    /// Claim file (TOML with [[claims]] tables, or a JSON array)
    #[arg(long)]
    claims: PathBuf,

    /// Engine configuration (TOML); falls back to PROOF_ENGINE_CONFIG or defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base directory; each run writes into <base>/<YYYYmmdd_HHMMSS_mmm>/
    #[arg(long, default_value = "proof_results")]
    output_dir: PathBuf,

    /// Evaluate only, write nothing
    #[arg(long)]
    no_persist: bool,

    /// Evaluate claims concurrently
    #[arg(long)]
    parallel: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::from_env(),
    };
    let claims = ClaimSet::load(&args.claims)
        .with_context(|| format!("loading claims {}", args.claims.display()))?;
    let store = EntityStore::open_read_only(&args.db)
        .with_context(|| format!("opening entity store {}", args.db.display()))?;

    info!(
        "Loaded {} claims from {} (folds={}, seed={})",
        claims.claims.len(),
        args.claims.display(),
        config.cv_folds,
        config.cv_seed
    );

    let persist = !args.no_persist;
    let mut engine = ProofEngine::new(store, config);
    if persist {
        engine = engine.with_persister(ResultPersister::timestamped(&args.output_dir));
    }

    let run = |claim: &Claim| -> (String, EngineResult<ClaimResult>) {
        (claim.claim_id.clone(), engine.run_claim(claim, persist))
    };
    let outcomes: Vec<_> = if args.parallel {
        claims.claims.par_iter().map(run).collect()
    } else {
        claims.claims.iter().map(run).collect()
    };

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = 0usize;
    for (claim_id, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                println!(
                    "{:<32} {:<20} n={:<6} warnings={}",
                    claim_id,
                    result.status,
                    result.sample_size,
                    result.warnings.len()
                );
                results.push(result);
            }
            Err(e) => {
                error!("Claim {} failed: {}", claim_id, e);
                println!("{:<32} {:<20}", claim_id, "error");
                failures += 1;
            }
        }
    }

    if let Some(persister) = engine.persister() {
        let summary = persister
            .write_summary(&results)
            .context("writing summary.json")?;
        info!("Results written to {}", summary.display());
    }

    if failures > 0 {
        bail!("{} of {} claims failed", failures, claims.claims.len());
    }
    Ok(())
}
