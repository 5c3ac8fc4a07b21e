//! # Hostcheck Library
//!
//! Concurrent reachability checking for hosts-file entries grouped by category.
//!
//! The pipeline is: parse the hosts file (tracking `# CATEGORY` markers),
//! deduplicate `(identifier, alias)` pairs, probe every entry with a bounded
//! worker pool, then aggregate per-category totals.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hostcheck_lib::{CheckConfig, HostChecker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = HostChecker::new(CheckConfig::default().with_source("hosts"));
//!     let report = checker.run().await?;
//!
//!     println!(
//!         "{} checked, {} online, {} offline",
//!         report.aggregate.total, report.aggregate.reachable, report.aggregate.unreachable
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Category-aware parsing**: comment lines become category labels
//! - **Bounded concurrency**: fixed worker pool, hard per-probe timeouts
//! - **Pluggable probes**: system ping, TCP connect, HTTP, or your own [`Probe`]
//! - **Deterministic aggregation**: results independent of completion order

// Re-export main public API types and functions
// This makes them available as hostcheck_lib::TypeName
pub use aggregate::{aggregate, summarize};
pub use checker::HostChecker;
pub use concurrent::{CancelFlag, ConcurrentProcessor};
pub use config::{
    load_env_config, load_env_config_from, parse_duration_string, validate_duration,
    ConfigManager, DefaultsConfig, EnvConfig, FileConfig, OutputConfig, MAX_CONCURRENCY,
    MAX_TIMEOUT,
};
pub use error::HostCheckError;
pub use events::{format_entry_line, EventSink, NullSink, TracingSink};
pub use parser::{parse_hosts, parse_hosts_file, HostsParser, LineKind, COMMENTED_IP_PREFIXES};
pub use probes::{build_probe, HttpProbe, PingProbe, Probe, TcpProbe};
pub use types::{
    Aggregate, CategorySummary, CheckConfig, CheckReport, HostEntry, ProbeEvent, ProbeKind,
    ProbeOutcome, ProbeStatus, DEFAULT_CATEGORY, DEFAULT_CONCURRENCY, DEFAULT_NULL_ROUTE,
    MIN_PROBE_MARGIN,
};
pub use utils::{count_by_category, dedup_entries};

// Public modules
pub mod probes;

// Internal modules - these are not part of the public API
mod aggregate;
mod checker;
mod concurrent;
mod config;
mod error;
mod events;
mod parser;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, HostCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        features: get_enabled_features(),
    }
}

/// Information about the library build and features
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub features: Vec<&'static str>,
}

/// Get list of enabled features at compile time
#[allow(clippy::vec_init_then_push)]
fn get_enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "ping")]
    features.push("ping");

    #[cfg(feature = "tcp")]
    features.push("tcp");

    #[cfg(feature = "http")]
    features.push("http");

    features
}
