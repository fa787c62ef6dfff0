//! Claims
//!
//! A claim is one declarative hypothesis: which domain to assemble, which
//! outcome column to model, which name-derived features to test and which
//! rows to keep. Claims are immutable once built.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default minimum row count after filtering and dropping missing values.
pub const DEFAULT_SAMPLE_FLOOR: usize = 30;

// =============================================================================
// ASSET TYPE / TARGET KIND
// =============================================================================

/// Research domain, selects the dataset assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    #[serde(alias = "cryptocurrency")]
    Crypto,
    Domain,
    Hurricane,
    #[serde(alias = "mtg_card")]
    Mtg,
    Ship,
}

impl AssetType {
    pub const ALL: [AssetType; 5] = [
        AssetType::Crypto,
        AssetType::Domain,
        AssetType::Hurricane,
        AssetType::Mtg,
        AssetType::Ship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crypto => "crypto",
            Self::Domain => "domain",
            Self::Hurricane => "hurricane",
            Self::Mtg => "mtg",
            Self::Ship => "ship",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crypto" | "cryptocurrency" => Ok(Self::Crypto),
            "domain" => Ok(Self::Domain),
            "hurricane" => Ok(Self::Hurricane),
            "mtg" | "mtg_card" => Ok(Self::Mtg),
            "ship" => Ok(Self::Ship),
            _ => Err(EngineError::UnknownAssetType(s.to_string())),
        }
    }
}

/// Outcome variable type, selects the model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Continuous,
    Binary,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Binary => "binary",
        }
    }
}

// =============================================================================
// FILTER RULES
// =============================================================================

/// Scalar literal used by equality filters and predicate operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Literal {
    /// Numeric view; booleans map to 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Predicate descriptor: `{op, value}`, `{op, low, high}` or `{op, values}`.
///
/// `op` stays a free string so that unrecognized operators survive
/// deserialization and are ignored at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Literal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<Literal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Literal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Literal>>,
}

/// One filter entry: a literal means equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterRule {
    Predicate(FilterPredicate),
    Equals(Literal),
}

impl FilterRule {
    pub fn op(op: &str, value: Literal) -> Self {
        Self::Predicate(FilterPredicate {
            op: op.to_string(),
            value: Some(value),
            low: None,
            high: None,
            values: None,
        })
    }

    pub fn between(low: Literal, high: Literal) -> Self {
        Self::Predicate(FilterPredicate {
            op: "between".to_string(),
            value: None,
            low: Some(low),
            high: Some(high),
            values: None,
        })
    }

    pub fn one_of(values: Vec<Literal>) -> Self {
        Self::Predicate(FilterPredicate {
            op: "in".to_string(),
            value: None,
            low: None,
            high: None,
            values: Some(values),
        })
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(lit) => write!(f, "== {}", lit),
            Self::Predicate(p) => {
                write!(f, "{}", p.op)?;
                if let Some(v) = &p.value {
                    write!(f, " {}", v)?;
                }
                if let (Some(lo), Some(hi)) = (&p.low, &p.high) {
                    write!(f, " [{}, {}]", lo, hi)?;
                }
                if let Some(vs) = &p.values {
                    write!(f, " ({} values)", vs.len())?;
                }
                Ok(())
            }
        }
    }
}

/// Serializes filter entries as a mapping while keeping declaration order.
mod ordered_filters {
    use super::FilterRule;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(
        entries: &[(String, FilterRule)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (column, rule) in entries {
            map.serialize_entry(column, rule)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, FilterRule)>, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Vec<(String, FilterRule)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of column names to filter rules")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((column, rule)) = access.next_entry::<String, FilterRule>()? {
                    entries.push((column, rule));
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

// =============================================================================
// CLAIM
// =============================================================================

fn default_sample_floor() -> usize {
    DEFAULT_SAMPLE_FLOOR
}

/// Declarative hypothesis evaluated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: String,
    pub asset_type: AssetType,
    pub target_column: String,
    pub target_kind: TargetKind,
    pub features: Vec<String>,
    #[serde(default)]
    pub control_features: Vec<String>,
    #[serde(default, with = "ordered_filters")]
    pub filters: Vec<(String, FilterRule)>,
    #[serde(default = "default_sample_floor")]
    pub sample_floor: usize,
    /// Consumed by assemblers that derive a breakout-style flag column.
    #[serde(default)]
    pub breakout_threshold: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Claim {
    pub fn new(
        claim_id: impl Into<String>,
        asset_type: AssetType,
        target_column: impl Into<String>,
        target_kind: TargetKind,
        features: &[&str],
    ) -> Self {
        Self {
            claim_id: claim_id.into(),
            asset_type,
            target_column: target_column.into(),
            target_kind,
            features: features.iter().map(|s| s.to_string()).collect(),
            control_features: Vec::new(),
            filters: Vec::new(),
            sample_floor: DEFAULT_SAMPLE_FLOOR,
            breakout_threshold: None,
            notes: None,
        }
    }

    pub fn with_controls(mut self, controls: &[&str]) -> Self {
        self.control_features = controls.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_filter(mut self, column: impl Into<String>, rule: FilterRule) -> Self {
        self.filters.push((column.into(), rule));
        self
    }

    pub fn with_sample_floor(mut self, floor: usize) -> Self {
        self.sample_floor = floor;
        self
    }

    pub fn with_breakout_threshold(mut self, threshold: f64) -> Self {
        self.breakout_threshold = Some(threshold);
        self
    }

    /// Features followed by controls, de-duplicated, first occurrence wins.
    ///
    /// This is the design-matrix column order.
    pub fn all_features(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.features
            .iter()
            .chain(self.control_features.iter())
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }

    /// `all_features()` plus the target column.
    pub fn required_columns(&self) -> Vec<String> {
        let mut columns = self.all_features();
        if !columns.contains(&self.target_column) {
            columns.push(self.target_column.clone());
        }
        columns
    }

    /// Decode a claim from an equivalent JSON mapping.
    ///
    /// The asset type is validated first so that an unknown domain surfaces
    /// as `UnknownAssetType` rather than a generic decode error.
    pub fn from_value(value: &serde_json::Value) -> EngineResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| EngineError::InvalidClaim("claim must be a mapping".to_string()))?;

        match obj.get("asset_type") {
            Some(serde_json::Value::String(raw)) => {
                raw.parse::<AssetType>()?;
            }
            Some(other) => return Err(EngineError::UnknownAssetType(other.to_string())),
            None => {
                return Err(EngineError::InvalidClaim(
                    "missing field `asset_type`".to_string(),
                ))
            }
        }

        serde_json::from_value(value.clone()).map_err(|e| {
            let id = obj
                .get("claim_id")
                .and_then(|v| v.as_str())
                .unwrap_or("<unnamed>");
            EngineError::InvalidClaim(format!("{}: {}", id, e))
        })
    }
}

// =============================================================================
// CLAIM FILES
// =============================================================================

#[derive(Debug, Deserialize)]
struct ClaimFile {
    #[serde(default)]
    claims: Vec<serde_json::Value>,
}

/// Batch of claims loaded from a TOML (`[[claims]]`) or JSON file.
#[derive(Debug, Clone, Default)]
pub struct ClaimSet {
    pub claims: Vec<Claim>,
}

impl ClaimSet {
    /// Load claims; the format is chosen by file extension (`.json` or TOML).
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    /// Accepts either a bare array of claims or `{"claims": [...]}`.
    pub fn from_json_str(contents: &str) -> EngineResult<Self> {
        let value: serde_json::Value = serde_json::from_str(contents)?;
        let raw = match value {
            serde_json::Value::Array(items) => items,
            other => serde_json::from_value::<ClaimFile>(other)?.claims,
        };
        Self::from_values(&raw)
    }

    pub fn from_toml_str(contents: &str) -> EngineResult<Self> {
        let file: ClaimFile =
            toml::from_str(contents).map_err(|e| EngineError::Config(e.to_string()))?;
        Self::from_values(&file.claims)
    }

    fn from_values(raw: &[serde_json::Value]) -> EngineResult<Self> {
        let claims = raw
            .iter()
            .map(Claim::from_value)
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Self { claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_features_preserves_first_occurrence() {
        let claim = Claim::new(
            "c1",
            AssetType::Crypto,
            "price_1yr_change",
            TargetKind::Continuous,
            &["syllable_count", "memorability_score"],
        )
        .with_controls(&["log_market_cap", "syllable_count", "rank"]);

        assert_eq!(
            claim.all_features(),
            vec!["syllable_count", "memorability_score", "log_market_cap", "rank"]
        );
    }

    #[test]
    fn test_all_features_dedups_within_features() {
        let claim = Claim::new(
            "c1",
            AssetType::Domain,
            "log_sale_price",
            TargetKind::Continuous,
            &["a", "b", "a"],
        )
        .with_controls(&["b", "c", "c"]);
        assert_eq!(claim.all_features(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_required_columns_appends_target_once() {
        let claim = Claim::new("c", AssetType::Ship, "was_sunk", TargetKind::Binary, &["x"]);
        assert_eq!(claim.required_columns(), vec!["x", "was_sunk"]);
    }

    #[test]
    fn test_from_value_parses_filters_in_declaration_order() {
        let value = json!({
            "claim_id": "mythic_price",
            "asset_type": "mtg",
            "target_column": "log_price",
            "target_kind": "continuous",
            "features": ["syllable_count"],
            "filters": {
                "rarity": "mythic",
                "cmc": {"op": "between", "low": 1, "high": 4},
                "set_code": {"op": "in", "values": ["NEO", "DMU"]},
                "price_usd": {"op": "gte", "value": 0.5}
            }
        });

        let claim = Claim::from_value(&value).unwrap();
        let columns: Vec<&str> = claim.filters.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(columns, vec!["rarity", "cmc", "set_code", "price_usd"]);
        assert_eq!(claim.filters[0].1, FilterRule::Equals(Literal::Text("mythic".into())));
        assert_eq!(
            claim.filters[1].1,
            FilterRule::between(Literal::Int(1), Literal::Int(4))
        );
        assert_eq!(claim.sample_floor, DEFAULT_SAMPLE_FLOOR);
        assert!(claim.control_features.is_empty());
    }

    #[test]
    fn test_from_value_rejects_unknown_asset_type() {
        let value = json!({
            "claim_id": "x",
            "asset_type": "racehorse",
            "target_column": "y",
            "target_kind": "binary",
            "features": []
        });
        match Claim::from_value(&value) {
            Err(EngineError::UnknownAssetType(t)) => assert_eq!(t, "racehorse"),
            other => panic!("expected UnknownAssetType, got {:?}", other),
        }
    }

    #[test]
    fn test_from_value_reports_missing_fields() {
        let value = json!({"claim_id": "x", "asset_type": "crypto"});
        assert!(matches!(
            Claim::from_value(&value),
            Err(EngineError::InvalidClaim(_))
        ));
    }

    #[test]
    fn test_unknown_op_survives_deserialization() {
        let value = json!({
            "claim_id": "x",
            "asset_type": "hurricane",
            "target_column": "log_damage",
            "target_kind": "continuous",
            "features": ["syllable_count"],
            "filters": {"year": {"op": "approximately", "value": 1990}}
        });
        let claim = Claim::from_value(&value).unwrap();
        match &claim.filters[0].1 {
            FilterRule::Predicate(p) => assert_eq!(p.op, "approximately"),
            other => panic!("expected predicate, got {:?}", other),
        }
    }

    #[test]
    fn test_claim_serialization_round_trip() {
        let claim = Claim::new(
            "c1",
            AssetType::Hurricane,
            "has_casualties",
            TargetKind::Binary,
            &["phonetic_harshness"],
        )
        .with_controls(&["category"])
        .with_filter("year", FilterRule::op("gte", Literal::Int(1950)))
        .with_sample_floor(40);

        let json = serde_json::to_string(&claim).unwrap();
        let back: Claim = serde_json::from_str(&json).unwrap();
        assert_eq!(back, claim);
    }

    #[test]
    fn test_claim_set_from_toml() {
        let toml = r#"
            [[claims]]
            claim_id = "harsh_names_kill"
            asset_type = "hurricane"
            target_column = "has_casualties"
            target_kind = "binary"
            features = ["phonetic_harshness"]
            control_features = ["category"]
            sample_floor = 25

            [claims.filters]
            year = { op = "gte", value = 1950 }

            [[claims]]
            claim_id = "short_domains"
            asset_type = "domain"
            target_column = "log_sale_price"
            target_kind = "continuous"
            features = ["character_length"]
        "#;

        let set = ClaimSet::from_toml_str(toml).unwrap();
        assert_eq!(set.claims.len(), 2);
        assert_eq!(set.claims[0].sample_floor, 25);
        assert_eq!(set.claims[0].filters.len(), 1);
        assert_eq!(set.claims[1].asset_type, AssetType::Domain);
    }

    #[test]
    fn test_claim_set_from_json_array() {
        let json = r#"[{
            "claim_id": "a",
            "asset_type": "cryptocurrency",
            "target_column": "is_breakout",
            "target_kind": "binary",
            "features": ["syllable_count"],
            "breakout_threshold": 250.0
        }]"#;
        let set = ClaimSet::from_json_str(json).unwrap();
        assert_eq!(set.claims[0].asset_type, AssetType::Crypto);
        assert_eq!(set.claims[0].breakout_threshold, Some(250.0));
    }
}
