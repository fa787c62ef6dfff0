//! Engine Errors
//!
//! Only infrastructure and configuration failures live here. Data
//! availability problems (`no_data`, `missing_columns`, `insufficient_sample`)
//! are encoded as result statuses, and numerical degeneracy is a `FitError`
//! downgraded to a warning by the orchestrator.

/// Fatal errors surfaced by `ProofEngine::run_claim`.
#[derive(Debug)]
pub enum EngineError {
    /// The claim named an asset type with no registered assembler.
    UnknownAssetType(String),
    /// The claim mapping could not be decoded into a `Claim`.
    InvalidClaim(String),
    /// Backing store failure.
    Store(rusqlite::Error),
    /// Filesystem failure while persisting results.
    Io(std::io::Error),
    Serialization(serde_json::Error),
    /// Engine or claim-file configuration could not be loaded.
    Config(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAssetType(t) => write!(f, "Unknown asset_type: {}", t),
            Self::InvalidClaim(reason) => write!(f, "Invalid claim: {}", reason),
            Self::Store(e) => write!(f, "Store error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::Config(reason) => write!(f, "Configuration error: {}", reason),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
