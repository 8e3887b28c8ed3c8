use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::ProbeError;
use crate::report::log_timestamp;

/// Classification of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Up,
    Slow,
    Down,
}

impl Verdict {
    /// Label used in the log file; a slow response is still a success there.
    pub fn log_label(self) -> &'static str {
        match self {
            Verdict::Up | Verdict::Slow => "SUCCESS",
            Verdict::Down => "FAILURE",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Up => write!(f, "UP"),
            Verdict::Slow => write!(f, "SLOW"),
            Verdict::Down => write!(f, "DOWN"),
        }
    }
}

/// Raw result of one check, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    /// Whether the target answered the way the protocol expects
    pub succeeded: bool,

    /// Latency in milliseconds, never negative
    pub elapsed_ms: f64,

    /// Cause of the failure (if the check failed)
    pub error: Option<ProbeError>,
}

impl ProbeOutcome {
    pub fn success(elapsed_ms: f64) -> Self {
        Self { succeeded: true, elapsed_ms: elapsed_ms.max(0.0), error: None }
    }

    pub fn failure(elapsed_ms: f64, error: ProbeError) -> Self {
        Self { succeeded: false, elapsed_ms: elapsed_ms.max(0.0), error: Some(error) }
    }

    /// Human-readable error text, if any
    pub fn error_text(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// A failed check, kept for the whole run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DowntimeEvent {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl std::fmt::Display for DowntimeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", log_timestamp(self.timestamp), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_negative_elapsed_is_clamped() {
        assert_eq!(ProbeOutcome::success(-3.0).elapsed_ms, 0.0);
    }

    #[test]
    fn test_failure_carries_error_text() {
        let outcome = ProbeOutcome::failure(0.0, ProbeError::HostUnreachable);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.error_text().as_deref(), Some("Host unreachable"));
    }

    #[test]
    fn test_downtime_event_display() {
        let event = DowntimeEvent {
            timestamp: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            message: "HTTP 503".to_string(),
        };
        assert_eq!(event.to_string(), "2024-03-09 14:05:07.000 - HTTP 503");
    }
}
