//! Regressive Proof Engine
//!
//! Evaluates declarative "claims" that an entity's name predicts a
//! real-world outcome. Each claim is assembled into a table from the entity
//! store, filtered, fitted with an in-sample diagnostic model, cross-validated
//! out of sample, summarized as effect sizes, and written out as a portable
//! JSON record.
//!
//! Binaries and integration tests use [`ProofEngine`] as the entry point.

pub mod assemblers;
pub mod claim;
pub mod config;
pub mod dataset;
pub mod effects;
pub mod engine;
pub mod error;
pub mod filter;
pub mod models;
pub mod persist;
pub mod portable;
pub mod result;
pub mod stats;
pub mod store;
pub mod validation;

pub use claim::{AssetType, Claim, ClaimSet, FilterRule, Literal, TargetKind};
pub use config::EngineConfig;
pub use dataset::{Cell, Dataset};
pub use engine::ProofEngine;
pub use error::{EngineError, EngineResult};
pub use persist::ResultPersister;
pub use result::{ClaimResult, ClaimStatus};
pub use store::EntityStore;
