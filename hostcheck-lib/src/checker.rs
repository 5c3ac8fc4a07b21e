//! Main host checker implementation.
//!
//! This module provides the `HostChecker` struct that orchestrates a run:
//! parsing and deduplicating the hosts file, probing entries concurrently,
//! and aggregating the outcomes into a `CheckReport`.

use crate::aggregate::aggregate;
use crate::concurrent::{CancelFlag, ConcurrentProcessor};
use crate::error::HostCheckError;
use crate::events::{EventSink, TracingSink};
use crate::parser::HostsParser;
use crate::probes::{build_probe, Probe};
use crate::types::{CheckConfig, CheckReport, HostEntry, ProbeEvent};
use crate::utils::dedup_entries;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Main checker that coordinates a reachability run.
///
/// # Example
///
/// ```rust,no_run
/// use hostcheck_lib::{CheckConfig, HostChecker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = HostChecker::new(CheckConfig::default().with_source("/etc/hosts"));
///     let report = checker.run().await?;
///
///     for category in &report.aggregate.categories {
///         println!("{}: {}/{}", category.category, category.reachable, category.total);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct HostChecker {
    /// Configuration settings for this checker instance
    config: CheckConfig,
    /// Reachability capability shared by every worker
    probe: Arc<dyn Probe>,
    /// Destination for progress events
    sink: Arc<dyn EventSink>,
    /// Cooperative cancellation for in-progress runs
    cancel: CancelFlag,
}

impl HostChecker {
    /// Create a checker using the stock probe named in `config` and a
    /// `tracing` event sink.
    pub fn new(config: CheckConfig) -> Self {
        let probe = build_probe(config.probe, config.port);
        Self::with_probe(config, probe)
    }

    /// Create a checker with a caller-supplied probe.
    pub fn with_probe(config: CheckConfig, probe: Arc<dyn Probe>) -> Self {
        Self {
            config,
            probe,
            sink: Arc::new(TracingSink),
            cancel: CancelFlag::new(),
        }
    }

    /// Replace the event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Handle that stops a run from dispatching further entries.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Parse and deduplicate a hosts file.
    ///
    /// # Errors
    ///
    /// Returns `HostCheckError::FileError` if the file cannot be read.
    pub fn load_entries<P: AsRef<Path>>(&self, path: P) -> Result<Vec<HostEntry>, HostCheckError> {
        let parser = HostsParser::new(self.config.null_route.clone());
        let parsed = parser.parse_file(path.as_ref())?;
        let parsed_count = parsed.len();

        let entries = dedup_entries(parsed);
        tracing::debug!(
            path = %path.as_ref().display(),
            parsed = parsed_count,
            unique = entries.len(),
            "hosts file loaded"
        );

        Ok(entries)
    }

    /// Probe a deduplicated entry list and aggregate the outcomes.
    ///
    /// Outcomes in the report are sorted by sequence. An empty list yields an
    /// empty report with zero totals.
    pub async fn check_entries(
        &self,
        entries: Vec<HostEntry>,
    ) -> Result<CheckReport, HostCheckError> {
        let total = entries.len();
        let processor = ConcurrentProcessor::new(
            self.config.concurrency,
            self.config.timeout,
            self.config.hard_timeout(),
        );

        self.sink.emit(&ProbeEvent::RunStarted {
            total,
            concurrency: processor.pool_size(total),
        });

        let start_time = Instant::now();
        let mut outcomes = processor
            .process(entries, Arc::clone(&self.probe), Arc::clone(&self.sink), &self.cancel)
            .await?;
        let duration = start_time.elapsed();

        outcomes.sort_by_key(|outcome| outcome.sequence);
        let aggregate = aggregate(&outcomes);
        let cancelled = outcomes.len() < total;

        if cancelled {
            tracing::warn!(
                completed = outcomes.len(),
                total,
                "run cancelled before all entries were checked"
            );
        }

        self.sink.emit(&ProbeEvent::RunFinished {
            checked: aggregate.total,
            reachable: aggregate.reachable,
            unreachable: aggregate.unreachable,
            duration,
        });

        Ok(CheckReport {
            outcomes,
            aggregate,
            duration,
            cancelled,
        })
    }

    /// Load a hosts file and check every unique entry in it.
    pub async fn check_file<P: AsRef<Path>>(&self, path: P) -> Result<CheckReport, HostCheckError> {
        let entries = self.load_entries(path)?;
        self.check_entries(entries).await
    }

    /// Check the hosts file named by the configuration's `source`.
    pub async fn run(&self) -> Result<CheckReport, HostCheckError> {
        self.check_file(&self.config.source).await
    }
}

impl Default for HostChecker {
    fn default() -> Self {
        Self::new(CheckConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    struct SuffixProbe(&'static str);

    #[async_trait]
    impl Probe for SuffixProbe {
        async fn probe(&self, target: &str, _timeout: Duration) -> bool {
            target.ends_with(self.0)
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<ProbeEvent>>);

    impl EventSink for RecordingSink {
        fn emit(&self, event: &ProbeEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn hosts_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn checker(probe: SuffixProbe) -> HostChecker {
        HostChecker::with_probe(CheckConfig::default(), Arc::new(probe)).with_sink(Arc::new(NullSink))
    }

    #[tokio::test]
    async fn test_check_file_end_to_end() {
        let file = hosts_file(
            "# NET\n10.0.0.1 a.up\n10.0.0.2 b.down\n10.0.0.3 c.up\n10.0.0.1 a.up\n# DNS\n8.8.8.8 dns.google\n",
        );
        let report = checker(SuffixProbe(".up")).check_file(file.path()).await.unwrap();

        assert_eq!(report.outcomes.len(), 4);
        let sequences: Vec<_> = report.outcomes.iter().map(|o| o.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);

        assert_eq!(report.aggregate.total, 4);
        assert_eq!(report.aggregate.reachable, 2);
        assert_eq!(report.aggregate.categories[0].category, "DNS");
        assert_eq!(report.aggregate.categories[1].category, "NET");
        assert_eq!(report.aggregate.categories[1].percent_reachable, 66.7);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_empty_file_completes_with_zero_totals() {
        let file = hosts_file("");
        let report = checker(SuffixProbe(".up")).check_file(file.path()).await.unwrap();

        assert!(report.outcomes.is_empty());
        assert_eq!(report.aggregate.total, 0);
        assert_eq!(report.aggregate.reachable, 0);
        assert_eq!(report.aggregate.unreachable, 0);
        assert!(report.aggregate.categories.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_probing() {
        let sink = Arc::new(RecordingSink::default());
        let checker = checker(SuffixProbe(".up")).with_sink(sink.clone());

        let err = checker.check_file("/no/such/hosts/file").await.unwrap_err();
        assert!(err.is_fatal_config());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_event_per_entry_plus_run_events() {
        let sink = Arc::new(RecordingSink::default());
        let checker = checker(SuffixProbe(".up")).with_sink(sink.clone());

        let entries: Vec<_> = (1..=5)
            .map(|i| HostEntry::new(format!("10.1.1.{}", i), "x.up", "LAB"))
            .collect();
        checker.check_entries(entries).await.unwrap();

        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 7);
        assert!(matches!(events[0], ProbeEvent::RunStarted { total: 5, concurrency: 5 }));
        assert!(matches!(events[6], ProbeEvent::RunFinished { checked: 5, reachable: 5, .. }));

        let mut sequences: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ProbeEvent::EntryCompleted { sequence, total: 5, .. } => Some(*sequence),
                _ => None,
            })
            .collect();
        sequences.sort_unstable();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_cancelled_run_is_flagged() {
        let checker = checker(SuffixProbe(".up"));
        checker.cancel_flag().cancel();

        let entries = vec![HostEntry::new("10.0.0.1", "a.up", "NET")];
        let report = checker.check_entries(entries).await.unwrap();
        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_load_entries_uses_configured_null_route() {
        let file = hosts_file("0.0.0.0 blocked.ads\n00.00.00.00 ghost.local\n");
        let config = CheckConfig::default().with_null_route("0.0.0.0");
        let checker = HostChecker::with_probe(config, Arc::new(SuffixProbe("")));

        let entries = checker.load_entries(file.path()).unwrap();
        assert_eq!(entries, vec![HostEntry::new("00.00.00.00", "ghost.local", "UNCATEGORIZED")]);
    }
}
