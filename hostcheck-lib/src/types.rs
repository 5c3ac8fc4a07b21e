//! Core data types for host reachability checking.
//!
//! This module defines all the main data structures used throughout the library,
//! including parsed host entries, probe outcomes, category summaries and the
//! configuration that drives a run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Category assigned to entries that appear before any category marker.
pub const DEFAULT_CATEGORY: &str = "UNCATEGORIZED";

/// Placeholder address that must never be probed.
pub const DEFAULT_NULL_ROUTE: &str = "00.00.00.00";

/// Upper bound on concurrent probe workers when none is configured.
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Smallest gap kept between the probe timeout and the engine's hard limit.
pub const MIN_PROBE_MARGIN: Duration = Duration::from_millis(100);

/// A single `(identifier, alias, category)` triple parsed from a hosts file.
///
/// Identity for deduplication is the pair `(identifier, alias)`; the category
/// travels with the entry but does not take part in equality of that key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostEntry {
    /// First field of the line: an IPv4 literal or a hostname
    pub identifier: String,

    /// A token following the identifier on the same line
    pub alias: String,

    /// Uppercased category label active when the line was parsed
    pub category: String,
}

impl HostEntry {
    pub fn new<I, A, C>(identifier: I, alias: A, category: C) -> Self
    where
        I: Into<String>,
        A: Into<String>,
        C: Into<String>,
    {
        Self {
            identifier: identifier.into(),
            alias: alias.into(),
            category: category.into(),
        }
    }

    /// The `(identifier, alias)` pair used for deduplication.
    pub fn key(&self) -> (&str, &str) {
        (&self.identifier, &self.alias)
    }
}

/// Result of probing one host entry.
///
/// `sequence` is the 1-based position of the entry in the deduplicated input
/// and is the only way to restore input order after concurrent completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub sequence: usize,
    pub identifier: String,
    pub alias: String,
    pub category: String,
    pub identifier_reachable: bool,
    pub alias_reachable: bool,
    pub reachable: bool,
}

impl ProbeOutcome {
    /// Build an outcome from an entry and its two sub-probe results.
    ///
    /// `reachable` is derived here so it can never disagree with the
    /// sub-probe flags.
    pub fn from_entry(
        sequence: usize,
        entry: &HostEntry,
        identifier_reachable: bool,
        alias_reachable: bool,
    ) -> Self {
        Self {
            sequence,
            identifier: entry.identifier.clone(),
            alias: entry.alias.clone(),
            category: entry.category.clone(),
            identifier_reachable,
            alias_reachable,
            reachable: identifier_reachable || alias_reachable,
        }
    }

    pub fn status(&self) -> ProbeStatus {
        ProbeStatus::from(self.reachable)
    }
}

/// Per-category reachability totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: usize,
    pub reachable: usize,
    pub unreachable: usize,
    /// Percentage of reachable entries, rounded to one decimal place
    pub percent_reachable: f64,
}

/// Global and per-category totals computed from a set of outcomes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregate {
    pub total: usize,
    pub reachable: usize,
    pub unreachable: usize,
    /// Sorted by category name ascending
    pub categories: Vec<CategorySummary>,
}

/// Everything a renderer needs after a run has finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// Outcomes sorted by `sequence`
    pub outcomes: Vec<ProbeOutcome>,

    pub aggregate: Aggregate,

    /// Wall-clock time spent in the probing phase
    #[serde(with = "duration_secs")]
    pub duration: Duration,

    /// Whether the run stopped early because cancellation was requested
    pub cancelled: bool,
}

impl CheckReport {
    pub fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
            aggregate: Aggregate::default(),
            duration: Duration::ZERO,
            cancelled: false,
        }
    }
}

/// Overall status of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "offline")]
    Offline,
}

impl ProbeStatus {
    /// Short label used in per-entry log lines.
    pub fn short_label(self) -> &'static str {
        match self {
            ProbeStatus::Online => "OK",
            ProbeStatus::Offline => "FAILED",
        }
    }
}

impl From<bool> for ProbeStatus {
    fn from(reachable: bool) -> Self {
        if reachable {
            ProbeStatus::Online
        } else {
            ProbeStatus::Offline
        }
    }
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStatus::Online => write!(f, "ONLINE"),
            ProbeStatus::Offline => write!(f, "OFFLINE"),
        }
    }
}

/// Observability events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProbeEvent {
    RunStarted {
        total: usize,
        concurrency: usize,
    },
    EntryCompleted {
        sequence: usize,
        total: usize,
        category: String,
        identifier: String,
        alias: String,
        status: ProbeStatus,
    },
    RunFinished {
        checked: usize,
        reachable: usize,
        unreachable: usize,
        #[serde(with = "duration_secs")]
        duration: Duration,
    },
}

/// Which stock probe implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// System `ping` utility, one echo request
    #[default]
    Ping,
    /// TCP connect to a fixed port
    Tcp,
    /// HTTP HEAD request
    Http,
}

impl std::str::FromStr for ProbeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ping" | "icmp" => Ok(ProbeKind::Ping),
            "tcp" => Ok(ProbeKind::Tcp),
            "http" => Ok(ProbeKind::Http),
            other => Err(format!("unknown probe '{}', use ping, tcp or http", other)),
        }
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeKind::Ping => write!(f, "ping"),
            ProbeKind::Tcp => write!(f, "tcp"),
            ProbeKind::Http => write!(f, "http"),
        }
    }
}

/// Configuration options for a checking run.
///
/// This struct allows fine-tuning of scheduling and parsing behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Maximum number of concurrent probe workers.
    /// The effective pool size is `min(concurrency, entries)`.
    /// Default: 50
    pub concurrency: usize,

    /// Timeout requested from each individual probe
    /// Default: 2 seconds
    #[serde(skip)]
    pub timeout: Duration,

    /// Extra time granted on top of `timeout` before the engine abandons a probe
    /// Default: 5 seconds
    #[serde(skip)]
    pub probe_margin: Duration,

    /// Identifier that marks a null-routed line
    /// Default: "00.00.00.00"
    pub null_route: String,

    /// Hosts file to read
    /// Default: "hosts"
    pub source: PathBuf,

    /// Probe implementation
    pub probe: ProbeKind,

    /// Port used by the TCP probe
    /// Default: 443
    pub port: u16,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(2),
            probe_margin: Duration::from_secs(5),
            null_route: DEFAULT_NULL_ROUTE.to_string(),
            source: PathBuf::from("hosts"),
            probe: ProbeKind::Ping,
            port: 443,
        }
    }
}

impl CheckConfig {
    /// Set the concurrency cap. Values below 1 are raised to 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the margin added to the timeout for the engine's hard limit.
    pub fn with_probe_margin(mut self, margin: Duration) -> Self {
        self.probe_margin = margin;
        self
    }

    /// Set the null-route sentinel.
    pub fn with_null_route<S: Into<String>>(mut self, null_route: S) -> Self {
        self.null_route = null_route.into();
        self
    }

    /// Set the hosts file path.
    pub fn with_source<P: Into<PathBuf>>(mut self, source: P) -> Self {
        self.source = source.into();
        self
    }

    /// Pool size for a batch of `entry_count` entries.
    pub fn effective_concurrency(&self, entry_count: usize) -> usize {
        self.concurrency.max(1).min(entry_count)
    }

    /// Hard limit applied to every probe call.
    ///
    /// Always strictly greater than `timeout`; the margin is raised to
    /// [`MIN_PROBE_MARGIN`] when smaller.
    pub fn hard_timeout(&self) -> Duration {
        self.timeout
            .saturating_add(self.probe_margin.max(MIN_PROBE_MARGIN))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_reachable_is_or_of_sub_probes() {
        let entry = HostEntry::new("10.0.0.1", "svc.local", "CORE");

        assert!(ProbeOutcome::from_entry(1, &entry, false, true).reachable);
        assert!(ProbeOutcome::from_entry(1, &entry, true, false).reachable);
        assert!(!ProbeOutcome::from_entry(1, &entry, false, false).reachable);
    }

    #[test]
    fn test_key_ignores_category() {
        let a = HostEntry::new("10.0.0.1", "svc.local", "CORE");
        let b = HostEntry::new("10.0.0.1", "svc.local", "EDGE");
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), ("10.0.0.1", "svc.local"));
    }

    #[test]
    fn test_effective_concurrency() {
        let config = CheckConfig::default();
        assert_eq!(config.effective_concurrency(10), 10);
        assert_eq!(config.effective_concurrency(500), 50);
        assert_eq!(config.effective_concurrency(0), 0);

        let config = CheckConfig::default().with_concurrency(0);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_hard_timeout_exceeds_probe_timeout() {
        let config = CheckConfig::default();
        assert!(config.hard_timeout() > config.timeout);
        assert_eq!(config.hard_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn test_zero_margin_still_leaves_a_gap() {
        let config = CheckConfig::default().with_probe_margin(Duration::ZERO);
        assert!(config.hard_timeout() > config.timeout);
        assert_eq!(config.hard_timeout(), Duration::from_secs(2) + MIN_PROBE_MARGIN);
    }

    #[test]
    fn test_huge_timeout_does_not_overflow() {
        let config = CheckConfig::default()
            .with_timeout(Duration::from_secs(u64::MAX))
            .with_probe_margin(Duration::from_secs(u64::MAX));
        assert_eq!(config.hard_timeout(), Duration::MAX);
    }

    #[test]
    fn test_probe_kind_from_str() {
        assert_eq!("ping".parse::<ProbeKind>(), Ok(ProbeKind::Ping));
        assert_eq!("TCP".parse::<ProbeKind>(), Ok(ProbeKind::Tcp));
        assert_eq!("http".parse::<ProbeKind>(), Ok(ProbeKind::Http));
        assert!("smtp".parse::<ProbeKind>().is_err());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = ProbeEvent::RunStarted {
            total: 3,
            concurrency: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "run_started");
        assert_eq!(json["total"], 3);
    }
}
