//! Utility functions for entry processing.
//!
//! This module contains the deduplicator and small helpers over entry lists
//! used by the checker and the CLI.

use crate::types::HostEntry;
use std::collections::{BTreeMap, HashSet};

/// Collapse repeated `(identifier, alias)` pairs, keeping the first occurrence.
///
/// The kept entry retains its category, so a pair listed under two categories
/// is attributed to whichever appears first in the input.
///
/// # Example
///
/// ```rust
/// use hostcheck_lib::{dedup_entries, HostEntry};
///
/// let entries = vec![
///     HostEntry::new("8.8.8.8", "dns.google", "DNS"),
///     HostEntry::new("8.8.8.8", "dns.google", "PUBLIC"),
/// ];
/// let unique = dedup_entries(entries);
/// assert_eq!(unique.len(), 1);
/// assert_eq!(unique[0].category, "DNS");
/// ```
pub fn dedup_entries(entries: Vec<HostEntry>) -> Vec<HostEntry> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(entries.len());

    entries
        .into_iter()
        .filter(|entry| {
            let (identifier, alias) = entry.key();
            seen.insert((identifier.to_owned(), alias.to_owned()))
        })
        .collect()
}

/// Count entries per category, sorted by category name.
pub fn count_by_category(entries: &[HostEntry]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.category.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Round a percentage to one decimal place.
pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
