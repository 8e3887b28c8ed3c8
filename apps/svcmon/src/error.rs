use std::io::Error as IoError;

use thiserror::Error;

/// Why a single check failed.
///
/// These never stop the monitor; they are recorded and reported like any
/// other result. The `Display` text is what ends up on the status line,
/// in downtime events and in the log file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("Timeout")]
    Timeout,
    #[error("Connection Error: {0}")]
    ConnectionFailure(String),
    #[error("DNS resolution failed: {0}")]
    DnsFailure(String),
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    #[error("Host unreachable")]
    HostUnreachable,
    #[error("HTTP {0}")]
    ProtocolError(u16),
    #[error("Error: {0}")]
    Unknown(String),
}

/// Conditions that end a monitoring run.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Unsupported check type: {0}")]
    UnsupportedProtocol(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed { path: String, source: IoError },
    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed { path: String, source: toml::de::Error },
}
