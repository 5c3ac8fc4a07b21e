//! Global and per-category reachability totals.

use crate::types::{Aggregate, CategorySummary, ProbeOutcome};
use crate::utils::round_one_decimal;
use std::collections::BTreeMap;

#[derive(Default)]
struct Tally {
    total: usize,
    reachable: usize,
}

/// Compute totals over a complete outcome set.
///
/// The result depends only on the multiset of outcomes, never on their order:
/// categories are grouped in a `BTreeMap` and come out sorted by name.
pub fn aggregate(outcomes: &[ProbeOutcome]) -> Aggregate {
    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();

    for outcome in outcomes {
        let tally = tallies.entry(outcome.category.as_str()).or_default();
        tally.total += 1;
        if outcome.reachable {
            tally.reachable += 1;
        }
    }

    let categories: Vec<CategorySummary> = tallies
        .into_iter()
        .map(|(category, tally)| summarize(category, tally.total, tally.reachable))
        .collect();

    let total = outcomes.len();
    let reachable = outcomes.iter().filter(|o| o.reachable).count();

    Aggregate {
        total,
        reachable,
        unreachable: total - reachable,
        categories,
    }
}

/// Build one category summary. `total == 0` yields `0.0` percent.
pub fn summarize(category: &str, total: usize, reachable: usize) -> CategorySummary {
    let percent_reachable = if total == 0 {
        0.0
    } else {
        round_one_decimal(reachable as f64 / total as f64 * 100.0)
    };

    CategorySummary {
        category: category.to_string(),
        total,
        reachable,
        unreachable: total - reachable,
        percent_reachable,
    }
}

impl Aggregate {
    /// Overall reachable percentage, rounded like the category figures.
    pub fn percent_reachable(&self) -> f64 {
        summarize("", self.total, self.reachable).percent_reachable
    }
}
