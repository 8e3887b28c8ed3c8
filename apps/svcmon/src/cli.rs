use std::path::PathBuf;

use clap::{ArgAction, Parser};

const EXAMPLES: &str = "\
Examples:
  # Check a web site every 100ms
  svcmon https://example.com -i 0.1

  # Check a TCP port every 50ms with a 10ms latency threshold
  svcmon db.example.com:5432 -t tcp -i 0.05 -T 10

  # Ping a host and keep a log
  svcmon 8.8.8.8 -t icmp -l monitor.log

  # Accept self-signed certificates
  svcmon https://dev.internal -k -i 0.1";

/// Command line arguments. Options left unset fall back to the config file,
/// then to built-in defaults.
#[derive(Debug, Parser)]
#[command(name = "svcmon", version, about, after_help = EXAMPLES)]
pub struct Cli {
    /// Target to monitor (URL, host:port or host/IP)
    pub target: String,

    /// Check type: http, tcp or icmp [default: http]
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub check_type: Option<String>,

    /// Seconds to wait after each check [default: 1.0, minimum: 0.001]
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<f64>,

    /// Per-check timeout in seconds [default: 5.0]
    #[arg(short = 'o', long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Latency above which a successful check is reported as slow [default: 100.0]
    #[arg(short = 'T', long, value_name = "MS")]
    pub threshold: Option<f64>,

    /// Append a line per check to this file
    #[arg(short, long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Skip TLS certificate verification (HTTP only)
    #[arg(short = 'k', long)]
    pub no_verify: bool,

    /// TOML file with default settings
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase diagnostic output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "svcmon", "-t", "tcp", "-i", "0.05", "-o", "2", "-T", "10", "-l", "m.log", "-k", "-vv",
            "db:5432",
        ])
        .unwrap();

        assert_eq!(cli.target, "db:5432");
        assert_eq!(cli.check_type.as_deref(), Some("tcp"));
        assert_eq!(cli.interval, Some(0.05));
        assert_eq!(cli.timeout, Some(2.0));
        assert_eq!(cli.threshold, Some(10.0));
        assert!(cli.no_verify);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_target_is_required() {
        assert!(Cli::try_parse_from(["svcmon"]).is_err());
    }
}
