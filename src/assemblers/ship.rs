//! Naval ship assembler: ship ⋈ name analysis.

use super::{at_least, log1p, query_dataset, DatasetAssembler};
use crate::claim::{AssetType, Claim};
use crate::dataset::{Cell, Dataset};
use crate::error::EngineResult;
use rusqlite::Connection;

/// Historical significance score at or above which a ship counts as decorated.
pub const DEFAULT_DECORATED_THRESHOLD: f64 = 70.0;

const COLUMNS: &[&str] = &[
    "name",
    "nation",
    "ship_type",
    "launch_year",
    "tonnage",
    "log_tonnage",
    "battles_engaged",
    "significance_score",
    "was_sunk",
    "is_decorated",
    "is_place_name",
    "is_saint_name",
    "is_virtue_name",
    "syllable_count",
    "character_length",
    "memorability_score",
    "authority_score",
];

const QUERY: &str = "
    SELECT s.name, s.nation, s.ship_type, s.launch_year, s.tonnage,
           s.battles_engaged, s.significance_score, s.was_sunk,
           a.is_place_name, a.is_saint_name, a.is_virtue_name,
           a.syllable_count, a.character_length, a.memorability_score,
           a.authority_score
    FROM ships s
    JOIN ship_name_analysis a ON a.ship_id = s.id
    ORDER BY s.id";

pub struct ShipAssembler;

impl DatasetAssembler for ShipAssembler {
    fn asset_type(&self) -> AssetType {
        AssetType::Ship
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn assemble(&self, conn: &Connection, claim: &Claim) -> EngineResult<Dataset> {
        let threshold = claim.breakout_threshold.unwrap_or(DEFAULT_DECORATED_THRESHOLD);

        query_dataset(conn, self.asset_type(), QUERY, COLUMNS, |row| {
            let tonnage: Option<f64> = row.get(4)?;
            let significance: Option<f64> = row.get(6)?;

            Ok(vec![
                Cell::opt_text(row.get(0)?),
                Cell::opt_text(row.get(1)?),
                Cell::opt_text(row.get(2)?),
                Cell::opt_int(row.get(3)?),
                Cell::opt_float(tonnage),
                log1p(tonnage),
                Cell::opt_int(row.get(5)?),
                Cell::opt_float(significance),
                Cell::opt_bool(row.get(7)?),
                at_least(significance, threshold),
                Cell::opt_bool(row.get(8)?),
                Cell::opt_bool(row.get(9)?),
                Cell::opt_bool(row.get(10)?),
                Cell::opt_int(row.get(11)?),
                Cell::opt_int(row.get(12)?),
                Cell::opt_float(row.get(13)?),
                Cell::opt_float(row.get(14)?),
            ])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::TargetKind;
    use crate::store::{EntityStore, ShipAnalysis, ShipRecord};

    fn ship(id: i64, significance: Option<f64>) -> ShipRecord {
        ShipRecord {
            id,
            name: format!("Ship {}", id),
            nation: Some("UK".into()),
            ship_type: Some("battleship".into()),
            launch_year: Some(1910),
            tonnage: Some(27_000.0),
            battles_engaged: Some(3),
            significance_score: significance,
            was_sunk: Some(id % 2 == 0),
        }
    }

    #[test]
    fn test_decorated_flag_uses_threshold() {
        let store = EntityStore::in_memory().unwrap();
        let analysis = ShipAnalysis {
            syllable_count: Some(2),
            character_length: Some(8),
            memorability_score: Some(50.0),
            authority_score: Some(66.0),
            is_place_name: Some(true),
            is_saint_name: Some(false),
            is_virtue_name: Some(false),
        };
        store.insert_ship(&ship(1, Some(85.0)), Some(&analysis)).unwrap();
        store.insert_ship(&ship(2, Some(40.0)), Some(&analysis)).unwrap();
        store.insert_ship(&ship(3, None), Some(&analysis)).unwrap();

        let claim = Claim::new("s", AssetType::Ship, "is_decorated", TargetKind::Binary, &["authority_score"]);
        let ds = store
            .with_connection(|conn| ShipAssembler.assemble(conn, &claim))
            .unwrap();
        assert_eq!(
            ds.column("is_decorated").unwrap(),
            vec![&Cell::Bool(true), &Cell::Bool(false), &Cell::Null]
        );

        let lenient = claim.with_breakout_threshold(30.0);
        let ds = store
            .with_connection(|conn| ShipAssembler.assemble(conn, &lenient))
            .unwrap();
        assert_eq!(
            ds.column("is_decorated").unwrap(),
            vec![&Cell::Bool(true), &Cell::Bool(true), &Cell::Null]
        );
        assert_eq!(ds.column("is_place_name").unwrap()[0], &Cell::Bool(true));
    }
}
