use std::time::Duration;
use std::{env, fmt, fs, path};

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::cli::Cli;
use crate::error::{ConfigError, MonitorError};
use crate::monitoring::checker::CheckType;

pub const DEFAULT_INTERVAL_SECS: f64 = 1.0;
pub const MIN_INTERVAL_SECS: f64 = 0.001;
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;
pub const DEFAULT_THRESHOLD_MS: f64 = 100.0;
/// Upper bound for the interval and the timeout (one day)
pub const MAX_DURATION_SECS: f64 = 86_400.0;

/// Optional defaults read from a TOML file. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub protocol: Option<String>,
    pub interval: Option<f64>,
    pub timeout: Option<f64>,
    pub threshold: Option<f64>,
    pub log_file: Option<path::PathBuf>,
    pub verify_tls: Option<bool>,
    pub json_summary: Option<bool>,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/svcmon/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Option<path::PathBuf> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else {
        env::home_dir()?.join(".config")
    };

    Some(path.join("svcmon/config.toml"))
}

impl FileConfig {
    /// Read the given file, or the default location if none was given.
    ///
    /// A missing default file yields an empty config; a missing explicit file
    /// is an error.
    pub fn load(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path = match optional_path {
            Some(path) => normalize_toml_path(path.as_ref()),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        debug!(path = %config_path.display(), "Reading config file");
        let raw_string = fs::read_to_string(&config_path).map_err(|source| {
            ConfigError::ReadFailed { path: config_path.display().to_string(), source }
        })?;
        Self::parse(&raw_string, &config_path)
    }

    fn parse(raw: &str, origin: &path::Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::ParseFailed {
            path: origin.display().to_string(),
            source,
        })
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub target: String,
    pub check_type: CheckType,
    pub interval: Duration,
    pub timeout: Duration,
    pub threshold_ms: f64,
    pub verify_tls: bool,
    pub log_file: Option<path::PathBuf>,
    pub json_summary: bool,
}

/// `host:port` with an all-digit port and no URL scheme
fn looks_like_host_port(target: &str) -> bool {
    if has_http_scheme(target) {
        return false;
    }
    match target.rsplit_once(':') {
        Some((_, port)) => !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

fn has_http_scheme(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

fn positive_secs(name: &str, value: f64, minimum: f64) -> Result<Duration, MonitorError> {
    let invalid = || {
        MonitorError::InvalidConfig(format!(
            "{name} must be greater than zero, between {minimum}s and {MAX_DURATION_SECS}s, got {value}"
        ))
    };
    if !(value >= minimum && value > 0.0 && value <= MAX_DURATION_SECS) {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(value).map_err(|_| invalid())
}

impl MonitorConfig {
    /// Merge command line and file settings; the command line wins.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, MonitorError> {
        let requested = cli.check_type.as_deref().or(file.protocol.as_deref());
        let mut target = cli.target.trim().to_string();
        if target.is_empty() {
            return Err(MonitorError::InvalidConfig("target must not be empty".into()));
        }

        let check_type = match requested {
            Some(name) => name.parse::<CheckType>()?,
            None if looks_like_host_port(&target) => {
                info!(address = %target, "Auto-detected TCP check (port specified)");
                CheckType::Tcp
            }
            None => CheckType::Http,
        };

        if check_type == CheckType::Http {
            if !has_http_scheme(&target) {
                target = format!("http://{target}");
            }
            let url = Url::parse(&target)
                .map_err(|e| MonitorError::InvalidConfig(format!("invalid URL '{target}': {e}")))?;
            if url.host_str().is_none() {
                return Err(MonitorError::InvalidConfig(format!("URL '{target}' has no host")));
            }
        }

        let interval = positive_secs(
            "interval",
            cli.interval.or(file.interval).unwrap_or(DEFAULT_INTERVAL_SECS),
            MIN_INTERVAL_SECS,
        )?;
        let timeout = positive_secs(
            "timeout",
            cli.timeout.or(file.timeout).unwrap_or(DEFAULT_TIMEOUT_SECS),
            0.0,
        )?;

        let threshold_ms = cli.threshold.or(file.threshold).unwrap_or(DEFAULT_THRESHOLD_MS);
        if !threshold_ms.is_finite() || threshold_ms < 0.0 {
            return Err(MonitorError::InvalidConfig(format!(
                "threshold must be a non-negative number of milliseconds, got {threshold_ms}"
            )));
        }

        Ok(Self {
            target,
            check_type,
            interval,
            timeout,
            threshold_ms,
            verify_tls: !cli.no_verify && file.verify_tls.unwrap_or(true),
            log_file: cli.log_file.clone().or(file.log_file),
            json_summary: cli.json || file.json_summary.unwrap_or(false),
        })
    }
}

impl fmt::Display for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_row = |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
            writeln!(f, "{:<11}{}", format!("{label}:"), value)
        };

        writeln!(f, "Monitoring {}", self.target)?;
        write_row(f, "Type", &self.check_type)?;
        write_row(f, "Interval", &format_args!("{}s", self.interval.as_secs_f64()))?;
        write_row(f, "Timeout", &format_args!("{}s", self.timeout.as_secs_f64()))?;
        write_row(f, "Threshold", &format_args!("{}ms", self.threshold_ms))?;
        if self.check_type == CheckType::Http {
            let tls = if self.verify_tls { "enabled" } else { "DISABLED" };
            write_row(f, "TLS verify", &tls)?;
        }
        if let Some(log_file) = &self.log_file {
            write_row(f, "Log", &log_file.display())?;
        }
        writeln!(f, "\n{}", "=".repeat(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("svcmon").chain(args.iter().copied()))
    }

    fn resolve(args: &[&str]) -> Result<MonitorConfig, MonitorError> {
        MonitorConfig::resolve(&cli(args), FileConfig::default())
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&["https://example.com"]).unwrap();
        assert_eq!(config.check_type, CheckType::Http);
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.threshold_ms, 100.0);
        assert!(config.verify_tls);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_http_scheme_is_added() {
        let config = resolve(&["example.com/health"]).unwrap();
        assert_eq!(config.target, "http://example.com/health");
    }

    #[test]
    fn test_port_suffix_selects_tcp() {
        let config = resolve(&["db.example.com:5432"]).unwrap();
        assert_eq!(config.check_type, CheckType::Tcp);
        assert_eq!(config.target, "db.example.com:5432");
    }

    #[test]
    fn test_explicit_type_disables_auto_detect() {
        let config = resolve(&["-t", "http", "example.com:8080"]).unwrap();
        assert_eq!(config.check_type, CheckType::Http);
        assert_eq!(config.target, "http://example.com:8080");
    }

    #[test]
    fn test_unknown_protocol_is_rejected() {
        let result = resolve(&["-t", "gopher", "example.com"]);
        assert!(matches!(result, Err(MonitorError::UnsupportedProtocol(_))));
    }

    #[test]
    fn test_interval_and_timeout_validation() {
        assert!(resolve(&["-i", "0.0001", "example.com"]).is_err());
        assert!(resolve(&["-o", "0", "example.com"]).is_err());
        assert!(resolve(&["--threshold=-5", "example.com"]).is_err());
        assert!(resolve(&["-i", "0.001", "example.com"]).is_ok());
    }

    #[test]
    fn test_huge_or_nan_durations_are_rejected() {
        assert!(matches!(
            resolve(&["-t", "icmp", "-o", "1e17", "127.0.0.1"]),
            Err(MonitorError::InvalidConfig(_))
        ));
        assert!(resolve(&["-i", "1e17", "example.com"]).is_err());
        assert!(resolve(&["-o", "NaN", "example.com"]).is_err());

        let config = resolve(&["-o", "86400", "-i", "86400", "example.com"]).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(86_400));
    }

    #[test]
    fn test_no_verify_flag() {
        let config = resolve(&["-k", "https://self-signed.example"]).unwrap();
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            protocol: Some("icmp".into()),
            interval: Some(2.5),
            threshold: Some(40.0),
            verify_tls: Some(false),
            ..FileConfig::default()
        };

        let config = MonitorConfig::resolve(&cli(&["-T", "10", "8.8.8.8"]), file).unwrap();
        assert_eq!(config.check_type, CheckType::Icmp);
        assert_eq!(config.interval, Duration::from_millis(2500));
        assert_eq!(config.threshold_ms, 10.0);
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_load_file_normalizes_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("monitor.toml"), "protocol = \"tcp\"\ninterval = 0.5\n").unwrap();

        let file = FileConfig::load(Some(dir.path().join("monitor"))).unwrap();
        assert_eq!(file.protocol.as_deref(), Some("tcp"));
        assert_eq!(file.interval, Some(0.5));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempdir().unwrap();
        let result = FileConfig::load(Some(dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = FileConfig::parse("colour = true\n", path::Path::new("inline.toml"));
        assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
    }

    #[test]
    fn test_banner_mentions_settings() {
        let config = resolve(&["-k", "-l", "out.log", "https://example.com"]).unwrap();
        let banner = config.to_string();
        assert!(banner.contains("Monitoring https://example.com"));
        assert!(banner.contains("HTTP"));
        assert!(banner.contains("DISABLED"));
        assert!(banner.contains("out.log"));
    }
}
