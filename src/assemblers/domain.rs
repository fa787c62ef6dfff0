//! Domain name sales assembler: sale ⋈ name analysis.

use super::{at_least, log1p, optimal_syllables, query_dataset, DatasetAssembler};
use crate::claim::{AssetType, Claim};
use crate::dataset::{Cell, Dataset};
use crate::error::EngineResult;
use rusqlite::Connection;

/// Sale price (USD) at or above which a domain counts as premium.
pub const DEFAULT_PREMIUM_THRESHOLD: f64 = 100_000.0;

const COLUMNS: &[&str] = &[
    "name",
    "tld",
    "is_dotcom",
    "sale_price",
    "log_sale_price",
    "sale_year",
    "character_length",
    "syllable_count",
    "memorability_score",
    "brandability_score",
    "is_dictionary_word",
    "has_numbers",
    "has_hyphen",
    "is_optimal_syllables",
    "is_premium",
];

const QUERY: &str = "
    SELECT d.name, d.tld, d.sale_price, d.sale_year,
           a.character_length, a.syllable_count, a.memorability_score,
           a.brandability_score, a.is_dictionary_word, a.has_numbers, a.has_hyphen
    FROM domains d
    JOIN domain_name_analysis a ON a.domain_id = d.id
    ORDER BY d.id";

pub struct DomainAssembler;

impl DatasetAssembler for DomainAssembler {
    fn asset_type(&self) -> AssetType {
        AssetType::Domain
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn assemble(&self, conn: &Connection, claim: &Claim) -> EngineResult<Dataset> {
        let threshold = claim.breakout_threshold.unwrap_or(DEFAULT_PREMIUM_THRESHOLD);

        query_dataset(conn, self.asset_type(), QUERY, COLUMNS, |row| {
            let tld: Option<String> = row.get(1)?;
            let price: Option<f64> = row.get(2)?;
            let syllables: Option<i64> = row.get(5)?;
            let is_dotcom = tld
                .as_deref()
                .map(|t| t.trim_start_matches('.').eq_ignore_ascii_case("com"));

            Ok(vec![
                Cell::opt_text(row.get(0)?),
                Cell::opt_text(tld),
                Cell::opt_bool(is_dotcom),
                Cell::opt_float(price),
                log1p(price),
                Cell::opt_int(row.get(3)?),
                Cell::opt_int(row.get(4)?),
                Cell::opt_int(syllables),
                Cell::opt_float(row.get(6)?),
                Cell::opt_float(row.get(7)?),
                Cell::opt_bool(row.get(8)?),
                Cell::opt_bool(row.get(9)?),
                Cell::opt_bool(row.get(10)?),
                optimal_syllables(syllables),
                at_least(price, threshold),
            ])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::TargetKind;
    use crate::store::{DomainAnalysis, DomainRecord, EntityStore};

    fn sale(id: i64, name: &str, tld: &str, price: f64) -> DomainRecord {
        DomainRecord {
            id,
            name: name.into(),
            tld: tld.into(),
            sale_price: Some(price),
            sale_year: Some(2019),
        }
    }

    fn analysis(syllables: i64) -> DomainAnalysis {
        DomainAnalysis {
            syllable_count: Some(syllables),
            character_length: Some(5),
            memorability_score: Some(72.0),
            brandability_score: Some(64.0),
            is_dictionary_word: Some(true),
            has_numbers: Some(false),
            has_hyphen: Some(false),
        }
    }

    #[test]
    fn test_engineered_columns() {
        let store = EntityStore::in_memory().unwrap();
        store.insert_domain(&sale(1, "voice", ".com", 150_000.0), Some(&analysis(1))).unwrap();
        store.insert_domain(&sale(2, "tiny-app", "io", 2_500.0), Some(&analysis(3))).unwrap();
        store.insert_domain(&sale(3, "orphan", "net", 10.0), None).unwrap();

        let claim = Claim::new("d", AssetType::Domain, "is_premium", TargetKind::Binary, &["syllable_count"]);
        let ds = store
            .with_connection(|conn| DomainAssembler.assemble(conn, &claim))
            .unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.column("is_dotcom").unwrap(),
            vec![&Cell::Bool(true), &Cell::Bool(false)]
        );
        assert_eq!(
            ds.column("is_premium").unwrap(),
            vec![&Cell::Bool(true), &Cell::Bool(false)]
        );
        assert_eq!(
            ds.column("is_optimal_syllables").unwrap(),
            vec![&Cell::Bool(false), &Cell::Bool(true)]
        );
        let log_price = ds.numeric_column("log_sale_price").unwrap();
        assert!((log_price[1].unwrap() - 2_501f64.ln()).abs() < 1e-12);
    }
}
