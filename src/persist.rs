//! Result Persister
//!
//! Writes one JSON file per claim into an explicitly configured directory.
//! There is no process-wide default location: callers either name the
//! directory or ask for a fresh timestamped subdirectory under a base path.
//!
//! ```text
//! <base>/<YYYYmmdd_HHMMSS_mmm>[_N]/
//!     claim_<claim_id>.json
//!     summary.json
//! ```

use crate::error::EngineResult;
use crate::portable::to_portable_value;
use crate::result::{ClaimResult, SummaryEntry};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone)]
pub struct ResultPersister {
    output_dir: PathBuf,
}

impl ResultPersister {
    /// Persist directly into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Persist into `<base>/<UTC timestamp>/`, millisecond resolution.
    /// A numeric suffix is appended if that directory already exists.
    pub fn timestamped(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        let mut dir = base.join(&stamp);
        let mut suffix = 1;
        while dir.exists() {
            dir = base.join(format!("{}_{}", stamp, suffix));
            suffix += 1;
        }
        Self::new(dir)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `claim_<id>.json`, with characters outside `[A-Za-z0-9_-]` replaced.
    pub fn claim_path(&self, claim_id: &str) -> PathBuf {
        let safe: String = claim_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.output_dir.join(format!("claim_{}.json", safe))
    }

    /// Write one claim result. Filesystem errors propagate.
    pub fn persist(&self, result: &ClaimResult) -> EngineResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.claim_path(&result.claim.claim_id);
        let json = serde_json::to_string_pretty(&result.to_portable_json()?)?;
        fs::write(&path, json)?;
        info!("Persisted claim {} -> {}", result.claim.claim_id, path.display());
        Ok(path)
    }

    /// Write `summary.json` aggregating a batch.
    pub fn write_summary(&self, results: &[ClaimResult]) -> EngineResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let entries: Vec<SummaryEntry> = results.iter().map(ClaimResult::summary_entry).collect();
        let path = self.output_dir.join(SUMMARY_FILE);
        fs::write(&path, serde_json::to_string_pretty(&to_portable_value(&entries)?)?)?;
        info!("Wrote summary of {} claims -> {}", entries.len(), path.display());
        Ok(path)
    }

    /// Read a persisted claim result back.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<ClaimResult> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{AssetType, Claim, TargetKind};
    use crate::result::ClaimStatus;

    #[test]
    fn test_claim_path_is_sanitized() {
        let p = ResultPersister::new("/tmp/out");
        assert_eq!(
            p.claim_path("crypto/short names?"),
            PathBuf::from("/tmp/out/claim_crypto_short_names_.json")
        );
    }

    #[test]
    fn test_timestamped_dir_is_under_base() {
        let p = ResultPersister::timestamped("/data/results");
        assert_eq!(p.output_dir().parent(), Some(Path::new("/data/results")));
        let name = p.output_dir().file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(name.len(), "20240101_120000_000".len());
    }

    #[test]
    fn test_timestamped_never_reuses_existing_dir() {
        let base = tempfile::tempdir().unwrap();
        let first = ResultPersister::timestamped(base.path());
        fs::create_dir_all(first.output_dir()).unwrap();
        let second = ResultPersister::timestamped(base.path());
        fs::create_dir_all(second.output_dir()).unwrap();
        let third = ResultPersister::timestamped(base.path());

        assert_ne!(first.output_dir(), second.output_dir());
        assert_ne!(second.output_dir(), third.output_dir());
        assert_ne!(first.output_dir(), third.output_dir());
        assert!(!third.output_dir().exists());
    }

    #[test]
    fn test_persist_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let persister = ResultPersister::new(dir.path().join("run"));
        let claim = Claim::new("no-rows", AssetType::Ship, "was_sunk", TargetKind::Binary, &["x"]);
        let result = ClaimResult::terminal(&claim, ClaimStatus::NoData, 0, vec![]);

        let path = persister.persist(&result).unwrap();
        assert!(path.ends_with("claim_no-rows.json"));
        assert_eq!(ResultPersister::load(&path).unwrap(), result);

        let summary = persister.write_summary(&[result]).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(summary).unwrap()).unwrap();
        assert_eq!(json[0]["claim_id"], "no-rows");
        assert_eq!(json[0]["status"], "no_data");
    }
}
