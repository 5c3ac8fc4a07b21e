//! Probe implementations for reachability checking.
//!
//! The engine only knows the [`Probe`] trait. Stock implementations cover the
//! system ping utility, a TCP connect, and an HTTP request; callers can plug in
//! anything else that answers "did this target respond within the timeout".

use crate::types::ProbeKind;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// System ping utility
pub mod ping;

/// TCP connect probe
pub mod tcp;

/// HTTP HEAD probe
pub mod http;

pub use http::HttpProbe;
pub use ping::PingProbe;
pub use tcp::TcpProbe;

/// A single reachability check.
///
/// Implementations must collapse every failure (timeout, refused connection,
/// spawn error) to `false`. Each call performs exactly one check and shares no
/// state with other calls.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, target: &str, timeout: Duration) -> bool;
}

/// Build a stock probe.
///
/// `port` is only used by the TCP probe.
pub fn build_probe(kind: ProbeKind, port: u16) -> Arc<dyn Probe> {
    match kind {
        ProbeKind::Ping => Arc::new(PingProbe::new()),
        ProbeKind::Tcp => Arc::new(TcpProbe::new(port)),
        ProbeKind::Http => Arc::new(HttpProbe::new()),
    }
}
