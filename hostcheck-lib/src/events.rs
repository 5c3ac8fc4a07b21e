//! Observability sinks for probe events.
//!
//! The engine never logs on its own during the concurrent phase; it hands one
//! [`ProbeEvent`] per completed entry to an [`EventSink`] while holding its
//! emission lock, so a sink sees events strictly one at a time.

use crate::types::ProbeEvent;

/// Consumer of engine events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ProbeEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &ProbeEvent) {}
}

/// Sink that forwards events to `tracing` at INFO level.
///
/// Per-entry events carry structured fields and a fixed-width message, e.g.
/// `[   3/120] [CORE                     ] 10.0.0.1             | svc-a.local | OK`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ProbeEvent) {
        match event {
            ProbeEvent::RunStarted { total, concurrency } => {
                tracing::info!(
                    total,
                    concurrency,
                    "Checking {} entries with {} workers",
                    total,
                    concurrency
                );
            }
            ProbeEvent::EntryCompleted {
                sequence,
                total,
                category,
                identifier,
                alias,
                status,
            } => {
                tracing::info!(
                    sequence,
                    total,
                    category = %category,
                    identifier = %identifier,
                    alias = %alias,
                    status = status.short_label(),
                    "{}",
                    format_entry_line(*sequence, *total, category, identifier, alias, status.short_label())
                );
            }
            ProbeEvent::RunFinished {
                checked,
                reachable,
                unreachable,
                duration,
            } => {
                tracing::info!(
                    checked,
                    reachable,
                    unreachable,
                    duration_secs = duration.as_secs_f64(),
                    "Checked {} entries: {} online, {} offline in {:.2}s",
                    checked,
                    reachable,
                    unreachable,
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Fixed-width progress line for one completed entry.
pub fn format_entry_line(
    sequence: usize,
    total: usize,
    category: &str,
    identifier: &str,
    alias: &str,
    status: &str,
) -> String {
    format!(
        "[{:4}/{}] [{:25}] {:20} | {:50} | {}",
        sequence, total, category, identifier, alias, status
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_entry_line() {
        let line = format_entry_line(3, 120, "CORE", "10.0.0.1", "svc-a.local", "OK");
        assert!(line.starts_with("[   3/120] [CORE "));
        assert!(line.contains("10.0.0.1             | svc-a.local"));
        assert!(line.ends_with("| OK"));
    }

    #[test]
    fn test_sinks_accept_all_events() {
        let events = [
            ProbeEvent::RunStarted {
                total: 1,
                concurrency: 1,
            },
            ProbeEvent::EntryCompleted {
                sequence: 1,
                total: 1,
                category: "NET".to_string(),
                identifier: "10.0.0.1".to_string(),
                alias: "a.local".to_string(),
                status: crate::types::ProbeStatus::Online,
            },
        ];
        for event in &events {
            NullSink.emit(event);
            TracingSink.emit(event);
        }
    }
}
