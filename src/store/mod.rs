//! Entity Store
//!
//! SQLite backing store for per-domain entity, name-analysis and snapshot
//! tables. The engine only reads from it; collectors (and test fixtures)
//! populate it through the typed writers in [`records`].
//!
//! # Schema Design
//!
//! Every domain has one entity table and one 1:1 analysis table keyed by the
//! entity id. Crypto additionally keeps a time series of price snapshots, of
//! which assemblers join only the most recent row per entity.

pub mod records;

use crate::error::EngineResult;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub use records::{
    CryptoAnalysis, CryptoRecord, DomainAnalysis, DomainRecord, HurricaneAnalysis,
    HurricaneRecord, MtgCardAnalysis, MtgCardRecord, PriceSnapshot, ShipAnalysis, ShipRecord,
};

const SCHEMA_SQL: &str = r#"
-- Cryptocurrencies
CREATE TABLE IF NOT EXISTS cryptocurrencies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    symbol TEXT NOT NULL,
    rank INTEGER,
    launch_year INTEGER
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS crypto_name_analysis (
    crypto_id TEXT PRIMARY KEY REFERENCES cryptocurrencies(id),
    syllable_count INTEGER,
    character_length INTEGER,
    memorability_score REAL,
    uniqueness_score REAL,
    phonetic_score REAL,
    pronounceability_score REAL
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS crypto_price_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crypto_id TEXT NOT NULL REFERENCES cryptocurrencies(id),
    recorded_at INTEGER NOT NULL,
    price_usd REAL,
    market_cap REAL,
    volume_24h REAL,
    price_30d_change REAL,
    price_1yr_change REAL
);

CREATE INDEX IF NOT EXISTS idx_crypto_price_latest
    ON crypto_price_history(crypto_id, recorded_at DESC, id);

-- Domain name sales
CREATE TABLE IF NOT EXISTS domains (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    tld TEXT NOT NULL,
    sale_price REAL,
    sale_year INTEGER
);

CREATE TABLE IF NOT EXISTS domain_name_analysis (
    domain_id INTEGER PRIMARY KEY REFERENCES domains(id),
    syllable_count INTEGER,
    character_length INTEGER,
    memorability_score REAL,
    brandability_score REAL,
    is_dictionary_word INTEGER,
    has_numbers INTEGER,
    has_hyphen INTEGER
);

-- Atlantic hurricanes
CREATE TABLE IF NOT EXISTS hurricanes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    year INTEGER,
    category INTEGER,
    max_wind_mph REAL,
    min_pressure_mb REAL,
    deaths INTEGER,
    damage_usd REAL,
    evacuation_ordered INTEGER,
    evacuated INTEGER,
    gender TEXT,
    retired INTEGER
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS hurricane_name_analysis (
    hurricane_id TEXT PRIMARY KEY REFERENCES hurricanes(id),
    syllable_count INTEGER,
    phonetic_harshness REAL,
    memorability_score REAL,
    name_femininity REAL
) WITHOUT ROWID;

-- Magic: The Gathering cards
CREATE TABLE IF NOT EXISTS mtg_cards (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    set_code TEXT,
    rarity TEXT,
    cmc REAL,
    price_usd REAL,
    edhrec_rank INTEGER,
    is_legendary INTEGER
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS mtg_card_analysis (
    card_id TEXT PRIMARY KEY REFERENCES mtg_cards(id),
    syllable_count INTEGER,
    character_length INTEGER,
    fantasy_score REAL,
    power_connotation REAL,
    memorability_score REAL
) WITHOUT ROWID;

-- Naval ships
CREATE TABLE IF NOT EXISTS ships (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    nation TEXT,
    ship_type TEXT,
    launch_year INTEGER,
    tonnage REAL,
    battles_engaged INTEGER,
    significance_score REAL,
    was_sunk INTEGER
);

CREATE TABLE IF NOT EXISTS ship_name_analysis (
    ship_id INTEGER PRIMARY KEY REFERENCES ships(id),
    syllable_count INTEGER,
    character_length INTEGER,
    memorability_score REAL,
    authority_score REAL,
    is_place_name INTEGER,
    is_saint_name INTEGER,
    is_virtue_name INTEGER
);
"#;

/// Shared handle to the backing SQLite database.
///
/// The connection sits behind a mutex so one store can serve independent
/// `run_claim` calls from several threads; each call only reads.
#[derive(Clone)]
pub struct EntityStore {
    conn: Arc<Mutex<Connection>>,
}

impl EntityStore {
    /// Open (or create) a store at `path` and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path.as_ref(), flags)?;
        conn.execute_batch(SCHEMA_SQL)?;
        info!("Entity store opened at {}", path.as_ref().display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an existing store without touching its schema.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the locked connection.
    pub fn with_connection<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Row count of `table`; used for startup logging.
    pub fn count(&self, table: &str) -> EngineResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', ""));
        let count: i64 =
            self.with_connection(|conn| conn.query_row(&sql, [], |row| row.get(0)))?;
        debug!("{} rows in {}", count, table);
        Ok(count)
    }
}
