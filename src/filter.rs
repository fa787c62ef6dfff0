//! Filter Evaluator
//!
//! Applies a claim's filter entries to a dataset with AND semantics, in
//! declaration order. Evaluation is best effort: an entry naming a column the
//! dataset does not have, an unrecognized operator, or a descriptor missing
//! its operands leaves the rows unchanged. Such entries are logged and
//! returned in `FilterOutcome::skipped` instead of failing the claim.

use crate::claim::{FilterPredicate, FilterRule, Literal};
use crate::dataset::{Cell, Dataset};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Filtered dataset plus a note for every entry that was ignored.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub dataset: Dataset,
    pub skipped: Vec<String>,
}

/// Apply every filter entry in order.
pub fn apply_filters(dataset: &Dataset, filters: &[(String, FilterRule)]) -> FilterOutcome {
    let mut current = dataset.clone();
    let mut skipped = Vec::new();

    for (column, rule) in filters {
        if !current.has_column(column) {
            let note = format!("filter on '{}' ignored: column not present", column);
            warn!("{}", note);
            skipped.push(note);
            continue;
        }

        let before = current.len();
        match rule {
            FilterRule::Equals(literal) => {
                current = current.filter_column(column, |cell| cell.equals_literal(literal));
            }
            FilterRule::Predicate(predicate) => match predicate_matcher(predicate) {
                Some(matcher) => {
                    current = current.filter_column(column, |cell| matcher.matches(cell));
                }
                None => {
                    let note = format!(
                        "filter on '{}' ignored: unsupported rule '{}'",
                        column, rule
                    );
                    warn!("{}", note);
                    skipped.push(note);
                    continue;
                }
            },
        }
        debug!(
            "filter {} {}: {} -> {} rows",
            column,
            rule,
            before,
            current.len()
        );
    }

    FilterOutcome {
        dataset: current,
        skipped,
    }
}

/// Resolved predicate with all operands present.
enum Matcher<'a> {
    Compare(&'a Literal, fn(Ordering) -> bool),
    Between(&'a Literal, &'a Literal),
    In(&'a [Literal]),
}

impl Matcher<'_> {
    fn matches(&self, cell: &Cell) -> bool {
        match self {
            Self::Compare(value, accept) => cell.compare_literal(value).map_or(false, accept),
            Self::Between(low, high) => {
                let above = cell.compare_literal(low).map_or(false, |o| o != Ordering::Less);
                let below = cell
                    .compare_literal(high)
                    .map_or(false, |o| o != Ordering::Greater);
                above && below
            }
            Self::In(values) => values.iter().any(|v| cell.equals_literal(v)),
        }
    }
}

fn predicate_matcher(predicate: &FilterPredicate) -> Option<Matcher<'_>> {
    let compare = |accept: fn(Ordering) -> bool| {
        predicate
            .value
            .as_ref()
            .map(|value| Matcher::Compare(value, accept))
    };

    match predicate.op.as_str() {
        "gte" => compare(|o| o != Ordering::Less),
        "gt" => compare(|o| o == Ordering::Greater),
        "lte" => compare(|o| o != Ordering::Greater),
        "lt" => compare(|o| o == Ordering::Less),
        "between" => match (&predicate.low, &predicate.high) {
            (Some(low), Some(high)) => Some(Matcher::Between(low, high)),
            _ => None,
        },
        "in" => predicate.values.as_deref().map(Matcher::In),
        _ => None,
    }
}
