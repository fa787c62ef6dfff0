//! Magic: The Gathering card assembler: card ⋈ name analysis.

use super::{at_least, log1p, optimal_syllables, query_dataset, DatasetAssembler};
use crate::claim::{AssetType, Claim};
use crate::dataset::{Cell, Dataset};
use crate::error::EngineResult;
use rusqlite::Connection;

/// Card price (USD) at or above which a card counts as high value.
pub const DEFAULT_HIGH_VALUE_THRESHOLD: f64 = 10.0;

const RARITIES: [&str; 4] = ["common", "uncommon", "rare", "mythic"];

const COLUMNS: &[&str] = &[
    "name",
    "price_usd",
    "log_price",
    "cmc",
    "edhrec_rank",
    "is_legendary",
    "set_code",
    "rarity",
    "rarity_common",
    "rarity_uncommon",
    "rarity_rare",
    "rarity_mythic",
    "is_high_value",
    "is_optimal_syllables",
    "syllable_count",
    "character_length",
    "fantasy_score",
    "power_connotation",
    "memorability_score",
];

const QUERY: &str = "
    SELECT c.name, c.price_usd, c.cmc, c.edhrec_rank, c.is_legendary, c.rarity,
           a.syllable_count, a.character_length, a.fantasy_score,
           a.power_connotation, a.memorability_score, c.set_code
    FROM mtg_cards c
    JOIN mtg_card_analysis a ON a.card_id = c.id
    ORDER BY c.id";

pub struct MtgAssembler;

impl DatasetAssembler for MtgAssembler {
    fn asset_type(&self) -> AssetType {
        AssetType::Mtg
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn assemble(&self, conn: &Connection, claim: &Claim) -> EngineResult<Dataset> {
        let threshold = claim.breakout_threshold.unwrap_or(DEFAULT_HIGH_VALUE_THRESHOLD);

        query_dataset(conn, self.asset_type(), QUERY, COLUMNS, |row| {
            let price: Option<f64> = row.get(1)?;
            let rarity: Option<String> = row.get(5)?;
            let rarity = rarity.map(|r| r.trim().to_ascii_lowercase());
            let syllables: Option<i64> = row.get(6)?;

            let mut cells = vec![
                Cell::opt_text(row.get(0)?),
                Cell::opt_float(price),
                log1p(price),
                Cell::opt_float(row.get(2)?),
                Cell::opt_int(row.get(3)?),
                Cell::opt_bool(row.get(4)?),
                Cell::opt_text(row.get::<_, Option<String>>(11)?.map(|s| s.trim().to_string())),
                Cell::opt_text(rarity.clone()),
            ];
            cells.extend(
                RARITIES
                    .iter()
                    .map(|r| Cell::Int((rarity.as_deref() == Some(*r)) as i64)),
            );
            cells.extend([
                at_least(price, threshold),
                optimal_syllables(syllables),
                Cell::opt_int(syllables),
                Cell::opt_int(row.get(7)?),
                Cell::opt_float(row.get(8)?),
                Cell::opt_float(row.get(9)?),
                Cell::opt_float(row.get(10)?),
            ]);
            Ok(cells)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::TargetKind;
    use crate::store::{EntityStore, MtgCardAnalysis, MtgCardRecord};

    fn card(id: &str, rarity: &str, price: f64) -> MtgCardRecord {
        MtgCardRecord {
            id: id.into(),
            name: id.into(),
            set_code: Some("LEA".into()),
            rarity: Some(rarity.into()),
            cmc: Some(3.0),
            price_usd: Some(price),
            edhrec_rank: Some(1200),
            is_legendary: Some(false),
        }
    }

    #[test]
    fn test_rarity_dummies_and_high_value() {
        let store = EntityStore::in_memory().unwrap();
        let analysis = MtgCardAnalysis {
            syllable_count: Some(3),
            character_length: Some(9),
            fantasy_score: Some(80.0),
            power_connotation: Some(70.0),
            memorability_score: Some(65.0),
        };
        store.insert_mtg_card(&card("a", "Mythic", 45.0), Some(&analysis)).unwrap();
        store.insert_mtg_card(&card("b", "common", 0.25), Some(&analysis)).unwrap();

        let claim = Claim::new("m", AssetType::Mtg, "log_price", TargetKind::Continuous, &["fantasy_score"]);
        let ds = store
            .with_connection(|conn| MtgAssembler.assemble(conn, &claim))
            .unwrap();

        assert_eq!(ds.columns().len(), COLUMNS.len());
        assert_eq!(
            ds.column("rarity").unwrap(),
            vec![&Cell::Text("mythic".into()), &Cell::Text("common".into())]
        );
        assert_eq!(
            ds.column("set_code").unwrap(),
            vec![&Cell::Text("LEA".into()), &Cell::Text("LEA".into())]
        );
        assert_eq!(
            ds.column("rarity_mythic").unwrap(),
            vec![&Cell::Int(1), &Cell::Int(0)]
        );
        assert_eq!(
            ds.column("rarity_common").unwrap(),
            vec![&Cell::Int(0), &Cell::Int(1)]
        );
        assert_eq!(
            ds.column("is_high_value").unwrap(),
            vec![&Cell::Bool(true), &Cell::Bool(false)]
        );
        assert_eq!(
            ds.column("syllable_count").unwrap(),
            vec![&Cell::Int(3), &Cell::Int(3)]
        );
    }
}
