//! Cryptocurrency assembler: coin ⋈ name analysis ⋈ latest price snapshot.

use super::{at_least, log1p, optimal_syllables, positive_ratio, query_dataset, DatasetAssembler};
use crate::claim::{AssetType, Claim};
use crate::dataset::{Cell, Dataset};
use crate::error::EngineResult;
use rusqlite::Connection;

/// `price_1yr_change` (percent) at or above which a coin counts as a breakout.
pub const DEFAULT_BREAKOUT_THRESHOLD: f64 = 100.0;

const COLUMNS: &[&str] = &[
    "name",
    "symbol",
    "rank",
    "syllable_count",
    "character_length",
    "memorability_score",
    "uniqueness_score",
    "phonetic_score",
    "pronounceability_score",
    "price_usd",
    "market_cap",
    "log_market_cap",
    "volume_24h",
    "volume_to_cap",
    "price_30d_change",
    "price_1yr_change",
    "is_optimal_syllables",
    "is_breakout",
];

// Latest snapshot per coin: newest recorded_at, lowest row id on ties.
const QUERY: &str = "
    SELECT c.name, c.symbol, c.rank,
           a.syllable_count, a.character_length, a.memorability_score,
           a.uniqueness_score, a.phonetic_score, a.pronounceability_score,
           p.price_usd, p.market_cap, p.volume_24h,
           p.price_30d_change, p.price_1yr_change
    FROM cryptocurrencies c
    JOIN crypto_name_analysis a ON a.crypto_id = c.id
    LEFT JOIN crypto_price_history p ON p.id = (
        SELECT h.id FROM crypto_price_history h
        WHERE h.crypto_id = c.id
        ORDER BY h.recorded_at DESC, h.id ASC
        LIMIT 1
    )
    ORDER BY c.id";

pub struct CryptoAssembler;

impl DatasetAssembler for CryptoAssembler {
    fn asset_type(&self) -> AssetType {
        AssetType::Crypto
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn assemble(&self, conn: &Connection, claim: &Claim) -> EngineResult<Dataset> {
        let threshold = claim.breakout_threshold.unwrap_or(DEFAULT_BREAKOUT_THRESHOLD);

        query_dataset(conn, self.asset_type(), QUERY, COLUMNS, |row| {
            let syllables: Option<i64> = row.get(3)?;
            let market_cap: Option<f64> = row.get(10)?;
            let volume: Option<f64> = row.get(11)?;
            let change_1y: Option<f64> = row.get(13)?;

            Ok(vec![
                Cell::opt_text(row.get(0)?),
                Cell::opt_text(row.get(1)?),
                Cell::opt_int(row.get(2)?),
                Cell::opt_int(syllables),
                Cell::opt_int(row.get(4)?),
                Cell::opt_float(row.get(5)?),
                Cell::opt_float(row.get(6)?),
                Cell::opt_float(row.get(7)?),
                Cell::opt_float(row.get(8)?),
                Cell::opt_float(row.get(9)?),
                Cell::opt_float(market_cap),
                log1p(market_cap),
                Cell::opt_float(volume),
                positive_ratio(volume, market_cap),
                Cell::opt_float(row.get(12)?),
                Cell::opt_float(change_1y),
                optimal_syllables(syllables),
                at_least(change_1y, threshold),
            ])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::TargetKind;
    use crate::store::{CryptoAnalysis, CryptoRecord, EntityStore, PriceSnapshot};

    fn coin(id: &str, rank: i64) -> CryptoRecord {
        CryptoRecord {
            id: id.into(),
            name: id.to_uppercase(),
            symbol: id.to_uppercase(),
            rank: Some(rank),
            launch_year: Some(2015),
        }
    }

    fn analysis(syllables: i64) -> CryptoAnalysis {
        CryptoAnalysis {
            syllable_count: Some(syllables),
            character_length: Some(6),
            memorability_score: Some(70.0),
            uniqueness_score: Some(55.0),
            phonetic_score: Some(60.0),
            pronounceability_score: Some(80.0),
        }
    }

    fn snapshot(at: i64, cap: f64, change_1y: f64) -> PriceSnapshot {
        PriceSnapshot {
            recorded_at: at,
            price_usd: Some(1.0),
            market_cap: Some(cap),
            volume_24h: Some(cap / 10.0),
            price_30d_change: Some(5.0),
            price_1yr_change: Some(change_1y),
        }
    }

    fn claim() -> Claim {
        Claim::new("c", AssetType::Crypto, "is_breakout", TargetKind::Binary, &["syllable_count"])
    }

    fn assemble(store: &EntityStore, claim: &Claim) -> Dataset {
        store
            .with_connection(|conn| CryptoAssembler.assemble(conn, claim))
            .unwrap()
    }

    #[test]
    fn test_latest_snapshot_wins_with_lowest_id_on_ties() {
        let store = EntityStore::in_memory().unwrap();
        store.insert_crypto(&coin("abc", 1), Some(&analysis(2))).unwrap();
        store.insert_price_snapshot("abc", &snapshot(100, 1_000.0, 10.0)).unwrap();
        store.insert_price_snapshot("abc", &snapshot(200, 2_000.0, 150.0)).unwrap();
        store.insert_price_snapshot("abc", &snapshot(200, 3_000.0, 20.0)).unwrap();

        let ds = assemble(&store, &claim());
        assert_eq!(ds.len(), 1);
        let caps = ds.numeric_column("market_cap").unwrap();
        assert_eq!(caps, vec![Some(2_000.0)]);
        let log_cap = ds.numeric_column("log_market_cap").unwrap()[0].unwrap();
        assert!((log_cap - 2_001f64.ln()).abs() < 1e-12);
        assert_eq!(ds.column("is_breakout").unwrap(), vec![&Cell::Bool(true)]);
        assert_eq!(ds.column("volume_to_cap").unwrap(), vec![&Cell::Float(0.1)]);
        assert_eq!(ds.column("is_optimal_syllables").unwrap(), vec![&Cell::Bool(true)]);
    }

    #[test]
    fn test_coins_without_analysis_are_excluded() {
        let store = EntityStore::in_memory().unwrap();
        store.insert_crypto(&coin("abc", 1), Some(&analysis(2))).unwrap();
        store.insert_crypto(&coin("xyz", 2), None).unwrap();
        assert_eq!(assemble(&store, &claim()).len(), 1);
    }

    #[test]
    fn test_breakout_threshold_and_zero_cap() {
        let store = EntityStore::in_memory().unwrap();
        store.insert_crypto(&coin("abc", 1), Some(&analysis(5))).unwrap();
        store.insert_price_snapshot("abc", &snapshot(100, 0.0, 60.0)).unwrap();

        let ds = assemble(&store, &claim().with_breakout_threshold(50.0));
        assert_eq!(ds.column("is_breakout").unwrap(), vec![&Cell::Bool(true)]);
        assert_eq!(ds.column("volume_to_cap").unwrap(), vec![&Cell::Null]);
        assert_eq!(ds.column("is_optimal_syllables").unwrap(), vec![&Cell::Bool(false)]);
    }

    #[test]
    fn test_coin_without_snapshot_has_missing_market_data() {
        let store = EntityStore::in_memory().unwrap();
        store.insert_crypto(&coin("abc", 1), Some(&analysis(2))).unwrap();
        let ds = assemble(&store, &claim());
        assert_eq!(ds.column("market_cap").unwrap(), vec![&Cell::Null]);
        assert_eq!(ds.column("is_breakout").unwrap(), vec![&Cell::Null]);
    }
}
