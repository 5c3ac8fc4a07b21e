//! Reachability via the system `ping` utility.
//!
//! One echo request per call. The child process is killed if the engine drops
//! the future after its hard timeout.

use super::Probe;
use crate::error::HostCheckError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Probe that shells out to `ping`.
#[derive(Debug, Clone)]
pub struct PingProbe {
    program: String,
}

impl PingProbe {
    pub fn new() -> Self {
        Self {
            program: "ping".to_string(),
        }
    }

    /// Use a different ping binary (e.g. an absolute path).
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn execute_ping(&self, target: &str, timeout: Duration) -> Result<bool, HostCheckError> {
        // ping would read a leading dash as an option
        if target.starts_with('-') {
            return Err(HostCheckError::probe(target, "refusing option-like target"));
        }

        let status = Command::new(&self.program)
            .args(ping_args(timeout))
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| {
                HostCheckError::probe(
                    target,
                    format!("Failed to execute {}: {}", self.program, e),
                )
            })?;

        Ok(status.success())
    }
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for PingProbe {
    async fn probe(&self, target: &str, timeout: Duration) -> bool {
        match self.execute_ping(target, timeout).await {
            Ok(success) => success,
            Err(e) => {
                tracing::debug!(error = %e, "ping probe failed");
                false
            }
        }
    }
}

/// Count and timeout flags for the platform's ping.
///
/// Windows and the BSD family (macOS included) take the wait in
/// milliseconds; Linux and other unixes take whole seconds, rounded up.
fn ping_args(timeout: Duration) -> Vec<String> {
    let millis = timeout.as_millis().max(1).to_string();

    if cfg!(windows) {
        vec!["-n".to_string(), "1".to_string(), "-w".to_string(), millis]
    } else if cfg!(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "dragonfly"
    )) {
        vec!["-c".to_string(), "1".to_string(), "-W".to_string(), millis]
    } else {
        let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        vec![
            "-c".to_string(),
            "1".to_string(),
            "-W".to_string(),
            secs.max(1).to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_ping_args_linux() {
        assert_eq!(ping_args(Duration::from_secs(2)), vec!["-c", "1", "-W", "2"]);
        assert_eq!(ping_args(Duration::from_millis(1500)), vec!["-c", "1", "-W", "2"]);
        assert_eq!(ping_args(Duration::from_millis(10)), vec!["-c", "1", "-W", "1"]);
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_ping_args_macos_uses_milliseconds() {
        assert_eq!(ping_args(Duration::from_secs(2)), vec!["-c", "1", "-W", "2000"]);
        assert_eq!(ping_args(Duration::from_millis(250)), vec!["-c", "1", "-W", "250"]);
    }

    #[cfg(windows)]
    #[test]
    fn test_ping_args_windows() {
        assert_eq!(ping_args(Duration::from_secs(2)), vec!["-n", "1", "-w", "2000"]);
    }

    #[test]
    fn test_dash_leading_target_is_never_passed_to_ping() {
        // `true` would report success for any arguments
        let probe = PingProbe::with_program("true");
        let reachable = tokio_test::block_on(probe.probe("-f", Duration::from_millis(100)));
        assert!(!reachable);

        let err = tokio_test::block_on(probe.execute_ping("--help", Duration::from_millis(100)))
            .unwrap_err();
        assert!(matches!(err, HostCheckError::ProbeError { .. }));
    }

    #[test]
    fn test_missing_binary_collapses_to_false() {
        let probe = PingProbe::with_program("hostcheck-no-such-ping-binary");
        let reachable =
            tokio_test::block_on(probe.probe("127.0.0.1", Duration::from_millis(100)));
        assert!(!reachable);
    }
}
