//! Hurricane assembler: storm ⋈ name analysis, with casualty and
//! evacuation-compliance outcomes.

use super::{log1p, positive_ratio, query_dataset, DatasetAssembler};
use crate::claim::{AssetType, Claim};
use crate::dataset::{Cell, Dataset};
use crate::error::EngineResult;
use rusqlite::Connection;

/// Saffir-Simpson category from which a storm is "major".
const MAJOR_CATEGORY: i64 = 3;

const COLUMNS: &[&str] = &[
    "name",
    "year",
    "category",
    "max_wind_mph",
    "min_pressure_mb",
    "deaths",
    "log_deaths",
    "damage_usd",
    "log_damage",
    "evacuation_compliance_rate",
    "has_casualties",
    "is_major",
    "gender",
    "gender_male",
    "gender_female",
    "retired",
    "syllable_count",
    "phonetic_harshness",
    "memorability_score",
    "name_femininity",
];

const QUERY: &str = "
    SELECT h.name, h.year, h.category, h.max_wind_mph, h.min_pressure_mb,
           h.deaths, h.damage_usd, h.evacuation_ordered, h.evacuated,
           h.gender, h.retired,
           a.syllable_count, a.phonetic_harshness, a.memorability_score,
           a.name_femininity
    FROM hurricanes h
    JOIN hurricane_name_analysis a ON a.hurricane_id = h.id
    ORDER BY h.year, h.id";

pub struct HurricaneAssembler;

impl DatasetAssembler for HurricaneAssembler {
    fn asset_type(&self) -> AssetType {
        AssetType::Hurricane
    }

    fn columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn assemble(&self, conn: &Connection, _claim: &Claim) -> EngineResult<Dataset> {
        query_dataset(conn, self.asset_type(), QUERY, COLUMNS, |row| {
            let category: Option<i64> = row.get(2)?;
            let deaths: Option<i64> = row.get(5)?;
            let damage: Option<f64> = row.get(6)?;
            let ordered: Option<i64> = row.get(7)?;
            let evacuated: Option<i64> = row.get(8)?;
            let gender: Option<String> = row.get(9)?;
            let gender = gender.map(|g| g.trim().to_ascii_uppercase());

            Ok(vec![
                Cell::opt_text(row.get(0)?),
                Cell::opt_int(row.get(1)?),
                Cell::opt_int(category),
                Cell::opt_float(row.get(3)?),
                Cell::opt_float(row.get(4)?),
                Cell::opt_int(deaths),
                log1p(deaths.map(|d| d as f64)),
                Cell::opt_float(damage),
                log1p(damage),
                positive_ratio(evacuated.map(|e| e as f64), ordered.map(|o| o as f64)),
                Cell::opt_bool(deaths.map(|d| d > 0)),
                Cell::opt_bool(category.map(|c| c >= MAJOR_CATEGORY)),
                Cell::opt_text(gender.clone()),
                Cell::Int((gender.as_deref() == Some("M")) as i64),
                Cell::Int((gender.as_deref() == Some("F")) as i64),
                Cell::opt_bool(row.get(10)?),
                Cell::opt_int(row.get(11)?),
                Cell::opt_float(row.get(12)?),
                Cell::opt_float(row.get(13)?),
                Cell::opt_float(row.get(14)?),
            ])
        })
    }
}
