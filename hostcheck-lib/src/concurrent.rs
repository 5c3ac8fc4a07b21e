//! Bounded-concurrency probing of host entries.
//!
//! A fixed pool of worker tasks drains a shared work queue of
//! sequence-tagged entries. Each unit probes the identifier, then the alias
//! when it differs, and pushes one [`ProbeOutcome`] into a shared collector.
//! Completion order is arbitrary; the sequence tag is what ties an outcome
//! back to its input position.

use crate::error::HostCheckError;
use crate::events::EventSink;
use crate::probes::Probe;
use crate::types::{HostEntry, ProbeEvent, ProbeOutcome, MIN_PROBE_MARGIN};
use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;

/// Cooperative cancellation signal shared between a caller and the processor.
///
/// Setting it stops workers from taking new units; units already in flight
/// run to completion or to their hard timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Manages concurrent probing operations.
#[derive(Debug, Clone)]
pub struct ConcurrentProcessor {
    max_concurrency: usize,
    probe_timeout: Duration,
    hard_timeout: Duration,
}

/// One unit of work: an entry and its 1-based position.
type Job = (usize, HostEntry);

/// State shared by every worker of a single batch.
struct Batch {
    queue: Mutex<VecDeque<Job>>,
    results: Mutex<Vec<ProbeOutcome>>,
    emit_lock: Mutex<()>,
    probe: Arc<dyn Probe>,
    sink: Arc<dyn EventSink>,
    cancel: CancelFlag,
    total: usize,
    probe_timeout: Duration,
    hard_timeout: Duration,
}

impl ConcurrentProcessor {
    /// Create a processor.
    ///
    /// `probe_timeout` is passed to the probe; `hard_timeout` bounds each call
    /// from the outside. A hard limit not above the probe timeout is replaced
    /// by `probe_timeout + MIN_PROBE_MARGIN`.
    pub fn new(max_concurrency: usize, probe_timeout: Duration, hard_timeout: Duration) -> Self {
        let hard_timeout = if hard_timeout > probe_timeout {
            hard_timeout
        } else {
            probe_timeout.saturating_add(MIN_PROBE_MARGIN)
        };

        Self {
            max_concurrency: max_concurrency.max(1),
            probe_timeout,
            hard_timeout,
        }
    }

    pub fn hard_timeout(&self) -> Duration {
        self.hard_timeout
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Number of workers used for `entry_count` entries.
    pub fn pool_size(&self, entry_count: usize) -> usize {
        self.max_concurrency.min(entry_count)
    }

    /// Probe every entry and collect the outcomes in completion order.
    ///
    /// Unless `cancel` is set during the run, the result holds exactly one
    /// outcome per entry with sequences `1..=entries.len()`. A failing or
    /// panicking probe counts as unreachable. Only a worker task that cannot be
    /// joined fails the batch.
    pub async fn process(
        &self,
        entries: Vec<HostEntry>,
        probe: Arc<dyn Probe>,
        sink: Arc<dyn EventSink>,
        cancel: &CancelFlag,
    ) -> Result<Vec<ProbeOutcome>, HostCheckError> {
        let total = entries.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let batch = Arc::new(Batch {
            queue: Mutex::new(entries.into_iter().enumerate().map(|(i, e)| (i + 1, e)).collect()),
            results: Mutex::new(Vec::with_capacity(total)),
            emit_lock: Mutex::new(()),
            probe,
            sink,
            cancel: cancel.clone(),
            total,
            probe_timeout: self.probe_timeout,
            hard_timeout: self.hard_timeout,
        });

        let mut workers = JoinSet::new();
        for worker in 0..self.pool_size(total) {
            let batch = Arc::clone(&batch);
            workers.spawn(async move { batch.run_worker(worker).await });
        }

        let mut first_failure = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "probe worker aborted");
                first_failure.get_or_insert(e);
            }
        }
        if let Some(e) = first_failure {
            return Err(e.into());
        }

        let outcomes = std::mem::take(&mut *lock(&batch.results));

        if outcomes.len() != total && !cancel.is_cancelled() {
            return Err(HostCheckError::internal(format!(
                "expected {} outcomes, collected {}",
                total,
                outcomes.len()
            )));
        }

        Ok(outcomes)
    }
}

impl Batch {
    async fn run_worker(&self, worker: usize) {
        let mut handled = 0usize;

        while let Some((sequence, entry)) = self.next_job() {
            let outcome = self.probe_entry(sequence, &entry).await;
            self.emit_completed(&outcome);
            lock(&self.results).push(outcome);
            handled += 1;
        }

        tracing::debug!(worker, handled, "probe worker finished");
    }

    fn next_job(&self) -> Option<Job> {
        if self.cancel.is_cancelled() {
            return None;
        }
        lock(&self.queue).pop_front()
    }

    async fn probe_entry(&self, sequence: usize, entry: &HostEntry) -> ProbeOutcome {
        let identifier_reachable = self.guarded_probe(&entry.identifier).await;

        // Alias equal to identifier is not probed again and reports false.
        let alias_reachable = if entry.alias != entry.identifier {
            self.guarded_probe(&entry.alias).await
        } else {
            false
        };

        ProbeOutcome::from_entry(sequence, entry, identifier_reachable, alias_reachable)
    }

    async fn guarded_probe(&self, target: &str) -> bool {
        let call = AssertUnwindSafe(self.probe.probe(target, self.probe_timeout)).catch_unwind();

        match tokio::time::timeout(self.hard_timeout, call).await {
            Ok(Ok(reachable)) => reachable,
            Ok(Err(_panic)) => {
                tracing::warn!(target, "probe panicked, counting as unreachable");
                false
            }
            Err(_elapsed) => {
                tracing::debug!(target, limit = ?self.hard_timeout, "probe exceeded hard timeout");
                false
            }
        }
    }

    fn emit_completed(&self, outcome: &ProbeOutcome) {
        let event = ProbeEvent::EntryCompleted {
            sequence: outcome.sequence,
            total: self.total,
            category: outcome.category.clone(),
            identifier: outcome.identifier.clone(),
            alias: outcome.alias.clone(),
            status: outcome.status(),
        };

        let _guard = lock(&self.emit_lock);
        self.sink.emit(&event);
    }
}

// A poisoned lock only means another worker panicked mid-push; the data is
// still a valid Vec/VecDeque.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
