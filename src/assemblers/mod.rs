//! Dataset Assemblers
//!
//! One assembler per asset type. Each joins the entity table with its
//! name-analysis table (inner join, so entities without analysis are
//! dropped), optionally joins the latest snapshot, and derives the
//! engineered columns claims refer to.
//!
//! Assemblers are read-only and never fail on an empty result: zero rows
//! yields a dataset with the full schema and no rows.

pub mod crypto;
pub mod domain;
pub mod hurricane;
pub mod mtg;
pub mod ship;

use crate::claim::{AssetType, Claim};
use crate::dataset::{Cell, Dataset};
use crate::error::EngineResult;
use rusqlite::{Connection, Row};
use tracing::debug;

pub use crypto::CryptoAssembler;
pub use domain::DomainAssembler;
pub use hurricane::HurricaneAssembler;
pub use mtg::MtgAssembler;
pub use ship::ShipAssembler;

/// Builds the modeling table for one asset type.
pub trait DatasetAssembler: Send + Sync {
    fn asset_type(&self) -> AssetType;

    /// Output schema, in column order.
    fn columns(&self) -> &'static [&'static str];

    fn assemble(&self, conn: &Connection, claim: &Claim) -> EngineResult<Dataset>;
}

/// Assembler registered for `asset_type`.
pub fn assembler_for(asset_type: AssetType) -> &'static dyn DatasetAssembler {
    match asset_type {
        AssetType::Crypto => &CryptoAssembler,
        AssetType::Domain => &DomainAssembler,
        AssetType::Hurricane => &HurricaneAssembler,
        AssetType::Mtg => &MtgAssembler,
        AssetType::Ship => &ShipAssembler,
    }
}

/// Run `sql` and build a dataset with `columns`, one row per result row.
pub(crate) fn query_dataset<F>(
    conn: &Connection,
    asset_type: AssetType,
    sql: &str,
    columns: &[&str],
    mut to_row: F,
) -> EngineResult<Dataset>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<Vec<Cell>>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| to_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut dataset = Dataset::empty(columns);
    for row in rows {
        dataset.push_row(row);
    }
    debug!("Assembled {} {} rows", dataset.len(), asset_type);
    Ok(dataset)
}

// ============================================================================
// Derivations shared across domains
// ============================================================================

/// `ln(1 + x)`, missing when `x` is missing or below -1.
pub(crate) fn log1p(value: Option<f64>) -> Cell {
    Cell::opt_float(value.filter(|v| *v > -1.0).map(f64::ln_1p))
}

/// `numerator / denominator`, missing unless the denominator is positive.
pub(crate) fn positive_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Cell {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Cell::float(n / d),
        _ => Cell::Null,
    }
}

/// Two or three syllables.
pub(crate) fn optimal_syllables(syllables: Option<i64>) -> Cell {
    Cell::opt_bool(syllables.map(|s| (2..=3).contains(&s)))
}

/// `value >= threshold`, missing when `value` is missing.
pub(crate) fn at_least(value: Option<f64>, threshold: f64) -> Cell {
    Cell::opt_bool(value.map(|v| v >= threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_asset_type_has_an_assembler() {
        for asset_type in AssetType::ALL {
            assert_eq!(assembler_for(asset_type).asset_type(), asset_type);
        }
    }

    #[test]
    fn test_shared_derivations() {
        assert_eq!(log1p(Some(0.0)), Cell::Float(0.0));
        assert_eq!(log1p(None), Cell::Null);
        assert_eq!(positive_ratio(Some(5.0), Some(0.0)), Cell::Null);
        assert_eq!(positive_ratio(Some(5.0), Some(20.0)), Cell::Float(0.25));
        assert_eq!(optimal_syllables(Some(3)), Cell::Bool(true));
        assert_eq!(optimal_syllables(Some(4)), Cell::Bool(false));
        assert_eq!(at_least(Some(100.0), 100.0), Cell::Bool(true));
        assert_eq!(at_least(None, 100.0), Cell::Null);
    }

    #[test]
    fn test_empty_store_yields_schema_only() {
        let store = crate::store::EntityStore::in_memory().unwrap();
        for asset_type in AssetType::ALL {
            let assembler = assembler_for(asset_type);
            let claim = Claim::new("c", asset_type, "y", crate::claim::TargetKind::Continuous, &["x"]);
            let ds = store
                .with_connection(|conn| assembler.assemble(conn, &claim))
                .unwrap();
            assert!(ds.is_empty());
            assert_eq!(ds.columns().len(), assembler.columns().len());
        }
    }
}
