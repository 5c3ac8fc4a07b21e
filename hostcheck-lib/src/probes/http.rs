//! Reachability via an HTTP request.
//!
//! Any HTTP response, whatever its status code, means the host answered.

use super::Probe;
use async_trait::async_trait;
use std::time::Duration;

/// Probe that sends `HEAD http://<target>/`.
#[derive(Clone)]
pub struct HttpProbe {
    http_client: reqwest::Client,
    scheme: &'static str,
}

impl HttpProbe {
    pub fn new() -> Self {
        // Probes go straight to the target, never through an env-configured proxy
        let http_client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            scheme: "http",
        }
    }

    /// Probe over HTTPS instead of plain HTTP.
    pub fn https() -> Self {
        Self {
            scheme: "https",
            ..Self::new()
        }
    }

    fn url_for(&self, target: &str) -> String {
        format!("{}://{}/", self.scheme, target)
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, target: &str, timeout: Duration) -> bool {
        let result = self
            .http_client
            .head(self.url_for(target))
            .timeout(timeout)
            .send()
            .await;

        match result {
            Ok(response) => {
                tracing::trace!(target, status = %response.status(), "http probe answered");
                true
            }
            Err(e) => {
                tracing::debug!(target, error = %e, "http probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_url_for() {
        assert_eq!(HttpProbe::new().url_for("svc.local"), "http://svc.local/");
        assert_eq!(HttpProbe::https().url_for("10.0.0.1"), "https://10.0.0.1/");
    }

    #[tokio::test]
    async fn test_any_response_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\n\r\n")
                    .await;
            }
        });

        let probe = HttpProbe::new();
        assert!(probe.probe(&addr.to_string(), Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = HttpProbe::new();
        assert!(!probe.probe(&addr.to_string(), Duration::from_secs(2)).await);
    }
}
