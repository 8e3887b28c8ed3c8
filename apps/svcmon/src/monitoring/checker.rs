use std::ffi::OsString;
use std::process::Stdio;
use std::str::FromStr;
use std::time::{Duration, Instant};

use tokio::net::{TcpStream, lookup_host};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, trace};

use super::types::ProbeOutcome;
use crate::error::{MonitorError, ProbeError};

/// User agent sent with every HTTP check
pub const USER_AGENT: &str = concat!("svcmon/", env!("CARGO_PKG_VERSION"));

const MAX_REDIRECTS: usize = 10;

/// Type of monitoring check to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckType {
    Http,
    Tcp,
    Icmp,
}

impl FromStr for CheckType {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" | "https" => Ok(CheckType::Http),
            "tcp" => Ok(CheckType::Tcp),
            "icmp" | "ping" => Ok(CheckType::Icmp),
            other => Err(MonitorError::UnsupportedProtocol(other.to_string())),
        }
    }
}

impl std::fmt::Display for CheckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckType::Http => write!(f, "HTTP"),
            CheckType::Tcp => write!(f, "TCP"),
            CheckType::Icmp => write!(f, "ICMP"),
        }
    }
}

/// Checker trait for different types of monitoring checks.
///
/// Per-check problems come back as a failed `ProbeOutcome`. An `Err` is
/// reserved for conditions that make further checks pointless.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, target: &str) -> Result<ProbeOutcome, MonitorError>;
}

/// The checker chosen for a run, fixed once at startup
pub enum Prober {
    Http(HttpChecker),
    Tcp(TcpChecker),
    Icmp(IcmpChecker),
}

impl Prober {
    pub fn new(
        check_type: CheckType,
        timeout_duration: Duration,
        verify_tls: bool,
    ) -> Result<Self, MonitorError> {
        Ok(match check_type {
            CheckType::Http => Prober::Http(HttpChecker::new(timeout_duration, verify_tls)?),
            CheckType::Tcp => Prober::Tcp(TcpChecker::new(timeout_duration)),
            CheckType::Icmp => Prober::Icmp(IcmpChecker::new(timeout_duration)),
        })
    }

    pub fn check_type(&self) -> CheckType {
        match self {
            Prober::Http(_) => CheckType::Http,
            Prober::Tcp(_) => CheckType::Tcp,
            Prober::Icmp(_) => CheckType::Icmp,
        }
    }
}

#[async_trait::async_trait]
impl Checker for Prober {
    async fn check(&self, target: &str) -> Result<ProbeOutcome, MonitorError> {
        match self {
            Prober::Http(checker) => checker.check(target).await,
            Prober::Tcp(checker) => checker.check(target).await,
            Prober::Icmp(checker) => checker.check(target).await,
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Flatten an error and its sources into one line
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

/// HTTP/HTTPS checker
pub struct HttpChecker {
    client: reqwest::Client,
    timeout_duration: Duration,
}

impl HttpChecker {
    pub fn new(timeout_duration: Duration, verify_tls: bool) -> Result<Self, MonitorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout_duration)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!verify_tls)
            .build()?;

        Ok(Self { client, timeout_duration })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, target: &str) -> Result<ProbeOutcome, MonitorError> {
        let start = Instant::now();

        let outcome = match self.client.get(target).send().await {
            Ok(response) => {
                let latency = elapsed_ms(start);
                let status = response.status();
                trace!(status = status.as_u16(), latency, "HTTP response headers received");

                // Consider 2xx and 3xx as success
                if status.is_success() || status.is_redirection() {
                    ProbeOutcome::success(latency)
                } else {
                    ProbeOutcome::failure(latency, ProbeError::ProtocolError(status.as_u16()))
                }
            }
            Err(e) if e.is_timeout() => {
                ProbeOutcome::failure(duration_ms(self.timeout_duration), ProbeError::Timeout)
            }
            Err(e) if e.is_connect() => {
                ProbeOutcome::failure(0.0, ProbeError::ConnectionFailure(error_chain(&e)))
            }
            Err(e) => ProbeOutcome::failure(0.0, ProbeError::Unknown(error_chain(&e))),
        };

        Ok(outcome)
    }
}

/// Split a `host:port` target on its last colon. IPv6 hosts may be bracketed.
pub fn parse_tcp_target(target: &str) -> Result<(String, u16), ProbeError> {
    let (host, port) = target
        .rsplit_once(':')
        .ok_or_else(|| ProbeError::InvalidTarget(format!("expected host:port, got '{target}'")))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(ProbeError::InvalidTarget(format!("missing host in '{target}'")));
    }

    let port = port
        .parse::<u16>()
        .map_err(|_| ProbeError::InvalidTarget(format!("invalid port '{port}'")))?;

    Ok((host.to_string(), port))
}

/// TCP port checker
pub struct TcpChecker {
    timeout_duration: Duration,
}

impl TcpChecker {
    pub fn new(timeout_duration: Duration) -> Self {
        Self { timeout_duration }
    }
}

#[async_trait::async_trait]
impl Checker for TcpChecker {
    async fn check(&self, target: &str) -> Result<ProbeOutcome, MonitorError> {
        let (host, port) = match parse_tcp_target(target) {
            Ok(parsed) => parsed,
            Err(e) => return Ok(ProbeOutcome::failure(0.0, e)),
        };

        let timeout_ms = duration_ms(self.timeout_duration);

        let addrs: Vec<_> =
            match timeout(self.timeout_duration, lookup_host((host.as_str(), port))).await {
                Ok(Ok(addrs)) => addrs.collect(),
                Ok(Err(e)) => {
                    return Ok(ProbeOutcome::failure(0.0, ProbeError::DnsFailure(e.to_string())));
                }
                Err(_) => return Ok(ProbeOutcome::failure(timeout_ms, ProbeError::Timeout)),
            };

        if addrs.is_empty() {
            return Ok(ProbeOutcome::failure(
                0.0,
                ProbeError::DnsFailure(format!("no addresses found for {host}")),
            ));
        }

        let start = Instant::now();
        let connect = TcpStream::connect(addrs.as_slice());

        let outcome = match timeout(self.timeout_duration, connect).await {
            Ok(Ok(stream)) => {
                let latency = elapsed_ms(start);
                drop(stream);
                ProbeOutcome::success(latency)
            }
            Ok(Err(e)) => ProbeOutcome::failure(
                elapsed_ms(start),
                ProbeError::ConnectionFailure(e.to_string()),
            ),
            Err(_) => ProbeOutcome::failure(timeout_ms, ProbeError::Timeout),
        };

        Ok(outcome)
    }
}

/// Pull the round-trip time out of ping's output, e.g. `time=12.3 ms`.
pub fn parse_round_trip_ms(output: &str) -> Option<f64> {
    let (_, rest) = output.split_once("time=")?;
    let token = rest.split_whitespace().next()?;
    token.trim_end_matches("ms").parse::<f64>().ok().filter(|ms| *ms >= 0.0)
}

/// Map a finished `ping` run to an outcome.
///
/// A clean exit counts as a reply; the round-trip time reported by `ping`
/// wins over the wall-clock latency of the whole process.
pub fn icmp_outcome(exited_ok: bool, stdout: &str, latency_ms: f64) -> ProbeOutcome {
    if !exited_ok {
        return ProbeOutcome::failure(latency_ms, ProbeError::HostUnreachable);
    }

    match parse_round_trip_ms(stdout) {
        Some(reported) => ProbeOutcome::success(reported),
        None => {
            debug!("No round-trip time in ping output, using wall-clock latency");
            ProbeOutcome::success(latency_ms)
        }
    }
}

/// ICMP checker, delegating to the system `ping` tool
pub struct IcmpChecker {
    timeout_duration: Duration,
    program: OsString,
}

impl IcmpChecker {
    pub fn new(timeout_duration: Duration) -> Self {
        Self::with_program(timeout_duration, "ping")
    }

    /// Use another executable taking `ping`'s arguments
    pub fn with_program(timeout_duration: Duration, program: impl Into<OsString>) -> Self {
        Self { timeout_duration, program: program.into() }
    }

    /// Per-packet wait in whole seconds, at least one
    fn wait_seconds(&self) -> u64 {
        (self.timeout_duration.as_secs_f64().round() as u64).max(1)
    }

    /// The per-packet wait plus one second of slack for process start-up
    fn deadline(&self) -> Duration {
        self.timeout_duration.saturating_add(Duration::from_secs(1))
    }

    fn ping_command(&self, target: &str) -> Command {
        let wait = self.wait_seconds();
        let wait_ms = wait.saturating_mul(1000).to_string();
        let wait_secs = wait.to_string();
        let mut command = Command::new(&self.program);

        if cfg!(windows) {
            command.args(["-n", "1", "-w", wait_ms.as_str(), target]);
        } else if cfg!(target_os = "macos") {
            command.args(["-c", "1", "-W", wait_ms.as_str(), target]);
        } else {
            command.args(["-c", "1", "-W", wait_secs.as_str(), target]);
        }

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait::async_trait]
impl Checker for IcmpChecker {
    async fn check(&self, target: &str) -> Result<ProbeOutcome, MonitorError> {
        if target.is_empty() || target.starts_with('-') {
            return Ok(ProbeOutcome::failure(
                0.0,
                ProbeError::InvalidTarget(format!("'{target}' is not a host name or address")),
            ));
        }

        let mut command = self.ping_command(target);
        let start = Instant::now();

        // Dropping the output future on timeout kills the child.
        let outcome = match timeout(self.deadline(), command.output()).await {
            Ok(Ok(output)) => icmp_outcome(
                output.status.success(),
                &String::from_utf8_lossy(&output.stdout),
                elapsed_ms(start),
            ),
            Ok(Err(e)) => {
                let program = self.program.to_string_lossy();
                let error = ProbeError::Unknown(format!("failed to run {program}: {e}"));
                ProbeOutcome::failure(0.0, error)
            }
            Err(_) => {
                ProbeOutcome::failure(duration_ms(self.timeout_duration), ProbeError::Timeout)
            }
        };

        Ok(outcome)
    }
}
