//! Reachability via a TCP handshake.

use super::Probe;
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Probe that treats a completed TCP connect to `target:port` as reachable.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    port: u16,
}

impl TcpProbe {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, target: &str, limit: Duration) -> bool {
        let address = (target, self.port);

        match timeout(limit, TcpStream::connect(address)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!(target, port = self.port, error = %e, "tcp connect failed");
                false
            }
            Err(_elapsed) => false,
        }
    }
}
