//! Effect Analyzer
//!
//! Human-readable effect summary computed straight from the cleaned data,
//! independent of any fitted coefficients. Only `claim.features` are
//! summarized; control features are not.

use crate::claim::{Claim, TargetKind};
use crate::dataset::Dataset;
use crate::stats;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const REQUIRES_BOTH_CLASSES: &str = "Binary effect analysis requires both classes";

/// Positive vs negative group means for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupLift {
    pub feature: String,
    pub positive_mean: Option<f64>,
    pub negative_mean: Option<f64>,
    pub lift: Option<f64>,
}

/// Pearson correlation of one feature with the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCorrelation {
    pub feature: String,
    pub pearson_r: f64,
    pub p_value: f64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectAnalysis {
    Binary {
        positive_count: usize,
        negative_count: usize,
        positive_share: f64,
        features: Vec<GroupLift>,
    },
    Continuous {
        target_mean: Option<f64>,
        target_std: Option<f64>,
        correlations: Vec<FeatureCorrelation>,
    },
    Unavailable {
        warnings: Vec<String>,
    },
}

impl EffectAnalysis {
    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Unavailable { warnings } => warnings,
            _ => &[],
        }
    }
}

/// Summarize `claim.features` against the target on a complete dataset.
pub fn analyze(claim: &Claim, dataset: &Dataset, min_pairs: usize) -> EffectAnalysis {
    match claim.target_kind {
        TargetKind::Binary => binary_lift(claim, dataset),
        TargetKind::Continuous => correlations(claim, dataset, min_pairs),
    }
}

fn binary_lift(claim: &Claim, dataset: &Dataset) -> EffectAnalysis {
    let target = dataset.numeric_column(&claim.target_column).unwrap_or_default();
    let is_positive: Vec<Option<bool>> = target.iter().map(|v| v.map(|y| y >= 0.5)).collect();
    let positive_count = is_positive.iter().filter(|v| **v == Some(true)).count();
    let negative_count = is_positive.iter().filter(|v| **v == Some(false)).count();

    if positive_count == 0 || negative_count == 0 {
        return EffectAnalysis::Unavailable {
            warnings: vec![REQUIRES_BOTH_CLASSES.to_string()],
        };
    }

    let features = claim
        .features
        .iter()
        .map(|name| {
            let values = dataset.numeric_column(name).unwrap_or_default();
            let group = |want: bool| -> Vec<f64> {
                values
                    .iter()
                    .zip(&is_positive)
                    .filter_map(|(v, pos)| if *pos == Some(want) { *v } else { None })
                    .collect()
            };
            let positive_mean = stats::mean(&group(true));
            let negative_mean = stats::mean(&group(false));
            GroupLift {
                feature: name.clone(),
                positive_mean,
                negative_mean,
                lift: positive_mean.zip(negative_mean).map(|(p, n)| p - n),
            }
        })
        .collect();

    EffectAnalysis::Binary {
        positive_count,
        negative_count,
        positive_share: positive_count as f64 / (positive_count + negative_count) as f64,
        features,
    }
}

fn correlations(claim: &Claim, dataset: &Dataset, min_pairs: usize) -> EffectAnalysis {
    let target = dataset.numeric_column(&claim.target_column).unwrap_or_default();
    let target_values: Vec<f64> = target.iter().flatten().copied().collect();

    let mut correlations = Vec::new();
    for name in &claim.features {
        let Some(values) = dataset.numeric_column(name) else {
            continue;
        };
        let (xs, ys): (Vec<f64>, Vec<f64>) = values
            .iter()
            .zip(&target)
            .filter_map(|(x, y)| x.zip(*y))
            .unzip();
        if xs.len() < min_pairs {
            debug!("skipping correlation for {}: {} pairs", name, xs.len());
            continue;
        }
        if let Some(c) = stats::pearson(&xs, &ys) {
            correlations.push(FeatureCorrelation {
                feature: name.clone(),
                pearson_r: c.r,
                p_value: c.p_value,
                n: c.n,
            });
        }
    }

    EffectAnalysis::Continuous {
        target_mean: stats::mean(&target_values),
        target_std: stats::sample_std(&target_values),
        correlations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::AssetType;
    use crate::dataset::Cell;

    fn binary_claim() -> Claim {
        Claim::new(
            "harsh",
            AssetType::Hurricane,
            "has_casualties",
            TargetKind::Binary,
            &["phonetic_harshness"],
        )
        .with_controls(&["category"])
    }

    #[test]
    fn test_binary_lift() {
        let ds = Dataset::from_rows(
            &["phonetic_harshness", "category", "has_casualties"],
            vec![
                vec![8.0.into(), 3i64.into(), true.into()],
                vec![6.0.into(), 4i64.into(), true.into()],
                vec![2.0.into(), 1i64.into(), false.into()],
                vec![4.0.into(), 2i64.into(), false.into()],
                vec![3.0.into(), 5i64.into(), false.into()],
            ],
        );
        match analyze(&binary_claim(), &ds, 10) {
            EffectAnalysis::Binary {
                positive_count,
                negative_count,
                positive_share,
                features,
            } => {
                assert_eq!((positive_count, negative_count), (2, 3));
                assert!((positive_share - 0.4).abs() < 1e-12);
                assert_eq!(features.len(), 1, "controls are not summarized");
                assert_eq!(features[0].positive_mean, Some(7.0));
                assert_eq!(features[0].negative_mean, Some(3.0));
                assert_eq!(features[0].lift, Some(4.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_binary_single_class_warns() {
        let ds = Dataset::from_rows(
            &["phonetic_harshness", "category", "has_casualties"],
            vec![
                vec![8.0.into(), 3i64.into(), Cell::Int(1)],
                vec![6.0.into(), 4i64.into(), Cell::Int(1)],
            ],
        );
        let effects = analyze(&binary_claim(), &ds, 10);
        assert_eq!(effects.warnings(), &[REQUIRES_BOTH_CLASSES.to_string()]);
        assert_eq!(
            serde_json::to_value(&effects).unwrap(),
            serde_json::json!({"warnings": ["Binary effect analysis requires both classes"]})
        );
    }

    #[test]
    fn test_continuous_correlations_respect_min_pairs() {
        let claim = Claim::new(
            "len",
            AssetType::Domain,
            "log_sale_price",
            TargetKind::Continuous,
            &["character_length", "syllable_count"],
        );
        let rows = (0..12)
            .map(|i| {
                let syllables = if i < 8 { Cell::Int(i % 3 + 1) } else { Cell::Null };
                vec![Cell::Int(i + 3), syllables, Cell::Float(20.0 - i as f64 * 1.5)]
            })
            .collect();
        let ds = Dataset::from_rows(&["character_length", "syllable_count", "log_sale_price"], rows);

        match analyze(&claim, &ds, 10) {
            EffectAnalysis::Continuous {
                target_mean,
                target_std,
                correlations,
            } => {
                assert_eq!(correlations.len(), 1);
                assert_eq!(correlations[0].feature, "character_length");
                assert!((correlations[0].pearson_r + 1.0).abs() < 1e-9);
                assert_eq!(correlations[0].n, 12);
                assert!((target_mean.unwrap() - 11.75).abs() < 1e-9);
                assert!(target_std.unwrap() > 0.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
