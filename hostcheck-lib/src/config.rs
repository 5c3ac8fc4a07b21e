//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and environment
//! variables and merging them with proper precedence rules.

use crate::error::HostCheckError;
use crate::types::ProbeKind;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest concurrency cap accepted from files and environment.
pub const MAX_CONCURRENCY: usize = 500;

/// Largest probe timeout or probe margin accepted from any layer.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// source = "hosts"
/// concurrency = 50
/// timeout = "2s"
/// probe = "ping"
///
/// [output]
/// path_template = "reports/hostcheck_{timestamp}"
/// format = "csv"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for run options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Report output preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Hosts file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Concurrency cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Per-probe timeout (as string, e.g., "2s", "500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Extra time before a probe is abandoned (as string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_margin: Option<String>,

    /// Null-route sentinel address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_route: Option<String>,

    /// Probe implementation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeKind>,

    /// Port for the TCP probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Output path without extension; `{timestamp}` is expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_template: Option<String>,

    /// Report format ("csv" or "json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were loaded
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, HostCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HostCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            HostCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            HostCheckError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is the lowest precedence, then the home directory file,
    /// then a file in the current directory.
    pub fn discover_and_load(&self) -> Result<FileConfig, HostCheckError> {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    if self.verbose {
                        tracing::info!(path = %path.display(), "loaded config file");
                    }
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping config file"),
            }
        }

        Ok(merged_config)
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./hostcheck.toml", "./.hostcheck.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".hostcheck.toml", "hostcheck.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("hostcheck").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win field by field.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    source: higher.source.or(lower.source),
                    concurrency: higher.concurrency.or(lower.concurrency),
                    timeout: higher.timeout.or(lower.timeout),
                    probe_margin: higher.probe_margin.or(lower.probe_margin),
                    null_route: higher.null_route.or(lower.null_route),
                    probe: higher.probe.or(lower.probe),
                    port: higher.port.or(lower.port),
                }),
                (lower, higher) => higher.or(lower),
            },
            output: match (lower.output, higher.output) {
                (Some(lower), Some(higher)) => Some(OutputConfig {
                    path_template: higher.path_template.or(lower.path_template),
                    format: higher.format.or(lower.format),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), HostCheckError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                    return Err(HostCheckError::config(format!(
                        "Concurrency must be between 1 and {}",
                        MAX_CONCURRENCY
                    )));
                }
            }

            for (name, value) in [
                ("timeout", &defaults.timeout),
                ("probe_margin", &defaults.probe_margin),
            ] {
                if let Some(value) = value {
                    let duration = parse_duration_string(value).ok_or_else(|| {
                        HostCheckError::config(format!(
                            "Invalid {} format '{}'. Use format like '2s', '500ms', '1m'",
                            name, value
                        ))
                    })?;
                    validate_duration(name, duration)?;
                }
            }

            if let Some(null_route) = &defaults.null_route {
                if null_route.trim().is_empty() {
                    return Err(HostCheckError::config("null_route cannot be empty"));
                }
            }
        }

        if let Some(format) = config.output.as_ref().and_then(|o| o.format.as_ref()) {
            if !matches!(format.to_lowercase().as_str(), "csv" | "json") {
                return Err(HostCheckError::config(format!(
                    "Invalid output format '{}', use csv or json",
                    format
                )));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via HC_* environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
    pub null_route: Option<String>,
    pub file: Option<String>,
    pub probe: Option<ProbeKind>,
    pub port: Option<u16>,
    pub output: Option<String>,
    pub config: Option<String>,
}

/// Load configuration from environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`] with an injectable variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let mut env_config = EnvConfig::default();

    if let Some(val) = non_empty("HC_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(n) if (1..=MAX_CONCURRENCY).contains(&n) => env_config.concurrency = Some(n),
            _ => tracing::warn!(
                "Invalid HC_CONCURRENCY='{}', must be 1-{}",
                val,
                MAX_CONCURRENCY
            ),
        }
    }

    if let Some(val) = non_empty("HC_TIMEOUT") {
        match parse_duration_string(&val) {
            Some(timeout) => match validate_duration("HC_TIMEOUT", timeout) {
                Ok(()) => env_config.timeout = Some(timeout),
                Err(e) => tracing::warn!("{}", e),
            },
            None => tracing::warn!(
                "Invalid HC_TIMEOUT='{}', use format like '2s', '500ms', '1m'",
                val
            ),
        }
    }

    if let Some(val) = non_empty("HC_PROBE") {
        match val.parse::<ProbeKind>() {
            Ok(kind) => env_config.probe = Some(kind),
            Err(e) => tracing::warn!("Invalid HC_PROBE: {}", e),
        }
    }

    if let Some(val) = non_empty("HC_PORT") {
        match val.trim().parse::<u16>() {
            Ok(port) if port > 0 => env_config.port = Some(port),
            _ => tracing::warn!("Invalid HC_PORT='{}', must be 1-65535", val),
        }
    }

    env_config.null_route = non_empty("HC_NULL_ROUTE").map(|v| v.trim().to_string());
    env_config.file = non_empty("HC_FILE");
    env_config.output = non_empty("HC_OUTPUT");
    env_config.config = non_empty("HC_CONFIG");

    tracing::debug!(?env_config, "environment configuration");
    env_config
}

/// Parse a duration string like "500ms", "2s", "1m" (bare numbers are seconds).
///
/// Returns `None` for malformed input or a minute count that overflows.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}

/// Check that a timeout or margin is non-zero and at most [`MAX_TIMEOUT`].
pub fn validate_duration(name: &str, value: Duration) -> Result<(), HostCheckError> {
    if value.is_zero() {
        return Err(HostCheckError::config(format!(
            "{} must be greater than zero",
            name
        )));
    }
    if value > MAX_TIMEOUT {
        return Err(HostCheckError::config(format!(
            "{} must be at most {}s",
            name,
            MAX_TIMEOUT.as_secs()
        )));
    }
    Ok(())
}
