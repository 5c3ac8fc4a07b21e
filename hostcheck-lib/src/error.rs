//! Error handling for host checking operations.
//!
//! Only a handful of conditions ever surface to the caller: an unreadable
//! hosts file, bad configuration, or a fault in the scheduling machinery.
//! Malformed lines and failed probes are absorbed where they happen.

use std::fmt;

/// Main error type for host checking operations.
#[derive(Debug, Clone)]
pub enum HostCheckError {
    /// Hosts file or config file missing or unreadable
    FileError {
        path: String,
        message: String,
    },

    /// Configuration errors (invalid settings, bad TOML, etc.)
    ConfigError {
        message: String,
    },

    /// A single probe failed to run. Never escapes the probing unit.
    ProbeError {
        target: String,
        message: String,
    },

    /// JSON serialization errors for report output
    ParseError {
        message: String,
    },

    /// Scheduling or other internal faults
    Internal {
        message: String,
    },
}

impl HostCheckError {
    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new probe error.
    pub fn probe<T: Into<String>, M: Into<String>>(target: T, message: M) -> Self {
        Self::ProbeError {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the run must abort before any probing starts.
    pub fn is_fatal_config(&self) -> bool {
        matches!(self, Self::FileError { .. } | Self::ConfigError { .. })
    }
}

impl fmt::Display for HostCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::ProbeError { target, message } => {
                write!(f, "Probe error for '{}': {}", target, message)
            }
            Self::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for HostCheckError {}

impl From<serde_json::Error> for HostCheckError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON serialization failed: {}", err),
        }
    }
}

impl From<std::io::Error> for HostCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<tokio::task::JoinError> for HostCheckError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal {
            message: format!("Probe worker failed: {}", err),
        }
    }
}
