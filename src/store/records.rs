//! Typed rows for the entity store and their writers.
//!
//! Entities and analyses are inserted together: an entity written without an
//! analysis is kept in the store but excluded by the assemblers' inner joins.

use super::EntityStore;
use crate::error::EngineResult;
use rusqlite::params;
use serde::{Deserialize, Serialize};

// ============================================================================
// Crypto
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoRecord {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub rank: Option<i64>,
    pub launch_year: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CryptoAnalysis {
    pub syllable_count: Option<i64>,
    pub character_length: Option<i64>,
    pub memorability_score: Option<f64>,
    pub uniqueness_score: Option<f64>,
    pub phonetic_score: Option<f64>,
    pub pronounceability_score: Option<f64>,
}

/// One row of `crypto_price_history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Unix seconds.
    pub recorded_at: i64,
    pub price_usd: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub price_30d_change: Option<f64>,
    pub price_1yr_change: Option<f64>,
}

// ============================================================================
// Domains
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub id: i64,
    pub name: String,
    pub tld: String,
    pub sale_price: Option<f64>,
    pub sale_year: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainAnalysis {
    pub syllable_count: Option<i64>,
    pub character_length: Option<i64>,
    pub memorability_score: Option<f64>,
    pub brandability_score: Option<f64>,
    pub is_dictionary_word: Option<bool>,
    pub has_numbers: Option<bool>,
    pub has_hyphen: Option<bool>,
}

// ============================================================================
// Hurricanes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HurricaneRecord {
    pub id: String,
    pub name: String,
    pub year: Option<i64>,
    pub category: Option<i64>,
    pub max_wind_mph: Option<f64>,
    pub min_pressure_mb: Option<f64>,
    pub deaths: Option<i64>,
    pub damage_usd: Option<f64>,
    pub evacuation_ordered: Option<i64>,
    pub evacuated: Option<i64>,
    /// `"M"` or `"F"`; anything else leaves both gender dummies at 0.
    pub gender: Option<String>,
    pub retired: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HurricaneAnalysis {
    pub syllable_count: Option<i64>,
    pub phonetic_harshness: Option<f64>,
    pub memorability_score: Option<f64>,
    pub name_femininity: Option<f64>,
}

// ============================================================================
// MTG cards
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtgCardRecord {
    pub id: String,
    pub name: String,
    pub set_code: Option<String>,
    /// `common`, `uncommon`, `rare` or `mythic`.
    pub rarity: Option<String>,
    pub cmc: Option<f64>,
    pub price_usd: Option<f64>,
    pub edhrec_rank: Option<i64>,
    pub is_legendary: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MtgCardAnalysis {
    pub syllable_count: Option<i64>,
    pub character_length: Option<i64>,
    pub fantasy_score: Option<f64>,
    pub power_connotation: Option<f64>,
    pub memorability_score: Option<f64>,
}

// ============================================================================
// Ships
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRecord {
    pub id: i64,
    pub name: String,
    pub nation: Option<String>,
    pub ship_type: Option<String>,
    pub launch_year: Option<i64>,
    pub tonnage: Option<f64>,
    pub battles_engaged: Option<i64>,
    pub significance_score: Option<f64>,
    pub was_sunk: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipAnalysis {
    pub syllable_count: Option<i64>,
    pub character_length: Option<i64>,
    pub memorability_score: Option<f64>,
    pub authority_score: Option<f64>,
    pub is_place_name: Option<bool>,
    pub is_saint_name: Option<bool>,
    pub is_virtue_name: Option<bool>,
}

// ============================================================================
// Writers
// ============================================================================

impl EntityStore {
    pub fn insert_crypto(
        &self,
        record: &CryptoRecord,
        analysis: Option<&CryptoAnalysis>,
    ) -> EngineResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cryptocurrencies (id, name, symbol, rank, launch_year)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &record.id,
                    &record.name,
                    &record.symbol,
                    record.rank,
                    record.launch_year,
                ],
            )?;
            if let Some(a) = analysis {
                conn.execute(
                    "INSERT OR REPLACE INTO crypto_name_analysis
                     (crypto_id, syllable_count, character_length, memorability_score,
                      uniqueness_score, phonetic_score, pronounceability_score)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        &record.id,
                        a.syllable_count,
                        a.character_length,
                        a.memorability_score,
                        a.uniqueness_score,
                        a.phonetic_score,
                        a.pronounceability_score,
                    ],
                )?;
            }
            Ok(())
        })
    }

    /// Append a price snapshot; returns its row id.
    pub fn insert_price_snapshot(
        &self,
        crypto_id: &str,
        snapshot: &PriceSnapshot,
    ) -> EngineResult<i64> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO crypto_price_history
                 (crypto_id, recorded_at, price_usd, market_cap, volume_24h,
                  price_30d_change, price_1yr_change)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    crypto_id,
                    snapshot.recorded_at,
                    snapshot.price_usd,
                    snapshot.market_cap,
                    snapshot.volume_24h,
                    snapshot.price_30d_change,
                    snapshot.price_1yr_change,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn insert_domain(
        &self,
        record: &DomainRecord,
        analysis: Option<&DomainAnalysis>,
    ) -> EngineResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO domains (id, name, tld, sale_price, sale_year)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    &record.name,
                    &record.tld,
                    record.sale_price,
                    record.sale_year,
                ],
            )?;
            if let Some(a) = analysis {
                conn.execute(
                    "INSERT OR REPLACE INTO domain_name_analysis
                     (domain_id, syllable_count, character_length, memorability_score,
                      brandability_score, is_dictionary_word, has_numbers, has_hyphen)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        record.id,
                        a.syllable_count,
                        a.character_length,
                        a.memorability_score,
                        a.brandability_score,
                        a.is_dictionary_word,
                        a.has_numbers,
                        a.has_hyphen,
                    ],
                )?;
            }
            Ok(())
        })
    }

    pub fn insert_hurricane(
        &self,
        record: &HurricaneRecord,
        analysis: Option<&HurricaneAnalysis>,
    ) -> EngineResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO hurricanes
                 (id, name, year, category, max_wind_mph, min_pressure_mb, deaths,
                  damage_usd, evacuation_ordered, evacuated, gender, retired)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    &record.id,
                    &record.name,
                    record.year,
                    record.category,
                    record.max_wind_mph,
                    record.min_pressure_mb,
                    record.deaths,
                    record.damage_usd,
                    record.evacuation_ordered,
                    record.evacuated,
                    &record.gender,
                    record.retired,
                ],
            )?;
            if let Some(a) = analysis {
                conn.execute(
                    "INSERT OR REPLACE INTO hurricane_name_analysis
                     (hurricane_id, syllable_count, phonetic_harshness, memorability_score,
                      name_femininity)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        &record.id,
                        a.syllable_count,
                        a.phonetic_harshness,
                        a.memorability_score,
                        a.name_femininity,
                    ],
                )?;
            }
            Ok(())
        })
    }

    pub fn insert_mtg_card(
        &self,
        record: &MtgCardRecord,
        analysis: Option<&MtgCardAnalysis>,
    ) -> EngineResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO mtg_cards
                 (id, name, set_code, rarity, cmc, price_usd, edhrec_rank, is_legendary)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &record.id,
                    &record.name,
                    &record.set_code,
                    &record.rarity,
                    record.cmc,
                    record.price_usd,
                    record.edhrec_rank,
                    record.is_legendary,
                ],
            )?;
            if let Some(a) = analysis {
                conn.execute(
                    "INSERT OR REPLACE INTO mtg_card_analysis
                     (card_id, syllable_count, character_length, fantasy_score,
                      power_connotation, memorability_score)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        &record.id,
                        a.syllable_count,
                        a.character_length,
                        a.fantasy_score,
                        a.power_connotation,
                        a.memorability_score,
                    ],
                )?;
            }
            Ok(())
        })
    }

    pub fn insert_ship(
        &self,
        record: &ShipRecord,
        analysis: Option<&ShipAnalysis>,
    ) -> EngineResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO ships
                 (id, name, nation, ship_type, launch_year, tonnage, battles_engaged,
                  significance_score, was_sunk)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id,
                    &record.name,
                    &record.nation,
                    &record.ship_type,
                    record.launch_year,
                    record.tonnage,
                    record.battles_engaged,
                    record.significance_score,
                    record.was_sunk,
                ],
            )?;
            if let Some(a) = analysis {
                conn.execute(
                    "INSERT OR REPLACE INTO ship_name_analysis
                     (ship_id, syllable_count, character_length, memorability_score,
                      authority_score, is_place_name, is_saint_name, is_virtue_name)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        record.id,
                        a.syllable_count,
                        a.character_length,
                        a.memorability_score,
                        a.authority_score,
                        a.is_place_name,
                        a.is_saint_name,
                        a.is_virtue_name,
                    ],
                )?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_without_analysis_is_stored() {
        let store = EntityStore::in_memory().unwrap();
        let ship = ShipRecord {
            id: 1,
            name: "Enterprise".into(),
            nation: Some("US".into()),
            ship_type: Some("carrier".into()),
            launch_year: Some(1936),
            tonnage: Some(19_800.0),
            battles_engaged: Some(20),
            significance_score: Some(98.0),
            was_sunk: Some(false),
        };
        store.insert_ship(&ship, None).unwrap();
        assert_eq!(store.count("ships").unwrap(), 1);
        assert_eq!(store.count("ship_name_analysis").unwrap(), 0);
    }

    #[test]
    fn test_price_snapshots_append() {
        let store = EntityStore::in_memory().unwrap();
        let coin = CryptoRecord {
            id: "btc".into(),
            name: "Bitcoin".into(),
            symbol: "BTC".into(),
            rank: Some(1),
            launch_year: Some(2009),
        };
        store.insert_crypto(&coin, Some(&CryptoAnalysis::default())).unwrap();
        let first = store
            .insert_price_snapshot("btc", &PriceSnapshot { recorded_at: 10, ..Default::default() })
            .unwrap();
        let second = store
            .insert_price_snapshot("btc", &PriceSnapshot { recorded_at: 10, ..Default::default() })
            .unwrap();
        assert!(second > first);
        assert_eq!(store.count("crypto_price_history").unwrap(), 2);
    }
}
