use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::types::{DowntimeEvent, Verdict};

/// Number of downtime events surfaced in a summary
pub const SUMMARY_EVENT_LIMIT: usize = 5;

const UNKNOWN_ERROR: &str = "Unknown error";

const RULE_WIDTH: usize = 60;

/// Running aggregate over every completed check of a run.
///
/// Invariants held after every `record`:
/// - `total_checks == successful_checks + failed_checks`
/// - `response_times.len() == successful_checks`
/// - `downtime_events.len() == failed_checks`
#[derive(Debug, Clone)]
pub struct RunningStats {
    total_checks: u64,
    successful_checks: u64,
    failed_checks: u64,
    response_times: Vec<f64>,
    downtime_events: Vec<DowntimeEvent>,
    start_time: DateTime<Local>,
}

impl RunningStats {
    pub fn new(start_time: DateTime<Local>) -> Self {
        Self {
            total_checks: 0,
            successful_checks: 0,
            failed_checks: 0,
            response_times: Vec::new(),
            downtime_events: Vec::new(),
            start_time,
        }
    }

    /// Account for one completed check.
    pub fn record(
        &mut self,
        verdict: Verdict,
        elapsed_ms: f64,
        error: Option<&str>,
        now: DateTime<Local>,
    ) {
        self.total_checks += 1;
        match verdict {
            Verdict::Up | Verdict::Slow => {
                self.successful_checks += 1;
                self.response_times.push(elapsed_ms);
            }
            Verdict::Down => {
                self.failed_checks += 1;
                self.downtime_events.push(DowntimeEvent {
                    timestamp: now,
                    message: error.unwrap_or(UNKNOWN_ERROR).to_string(),
                });
            }
        }
    }

    pub fn total_checks(&self) -> u64 {
        self.total_checks
    }

    pub fn successful_checks(&self) -> u64 {
        self.successful_checks
    }

    pub fn failed_checks(&self) -> u64 {
        self.failed_checks
    }

    pub fn response_times(&self) -> &[f64] {
        &self.response_times
    }

    pub fn downtime_events(&self) -> &[DowntimeEvent] {
        &self.downtime_events
    }

    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    /// Share of successful checks in percent, 0.0 before the first check.
    pub fn uptime_percentage(&self) -> f64 {
        if self.total_checks == 0 {
            return 0.0;
        }
        self.successful_checks as f64 / self.total_checks as f64 * 100.0
    }

    pub fn summarize(&self, now: DateTime<Local>) -> Summary {
        let duration_secs =
            (now - self.start_time).num_microseconds().unwrap_or(i64::MAX) as f64 / 1_000_000.0;

        Summary {
            duration_secs: duration_secs.max(0.0),
            total_checks: self.total_checks,
            successful_checks: self.successful_checks,
            failed_checks: self.failed_checks,
            uptime_percentage: self.uptime_percentage(),
            latency: LatencySummary::from_samples(&self.response_times),
            downtime_event_count: self.downtime_events.len(),
            first_downtime_events: self
                .downtime_events
                .iter()
                .take(SUMMARY_EVENT_LIMIT)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LatencySummary {
    pub samples: usize,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl LatencySummary {
    fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mid = sorted.len() / 2;
        let median_ms = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            samples: sorted.len(),
            mean_ms: sorted.iter().sum::<f64>() / sorted.len() as f64,
            median_ms,
            min_ms: sorted[0],
            max_ms: sorted[sorted.len() - 1],
        }
    }
}

/// Snapshot handed to the sink once the run is over
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub duration_secs: f64,
    pub total_checks: u64,
    pub successful_checks: u64,
    pub failed_checks: u64,
    pub uptime_percentage: f64,
    pub latency: LatencySummary,
    pub downtime_event_count: usize,
    pub first_downtime_events: Vec<DowntimeEvent>,
}

impl Summary {
    /// Events retained by the run but not listed in `first_downtime_events`
    pub fn remaining_events(&self) -> usize {
        self.downtime_event_count.saturating_sub(self.first_downtime_events.len())
    }
}

/// The plain-text summary block, framed by rules
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "\n{rule}")?;
        writeln!(f, "MONITORING SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Duration:          {:.2}s", self.duration_secs)?;
        writeln!(f, "Total checks:      {}", self.total_checks)?;
        writeln!(f, "Successful checks: {}", self.successful_checks)?;
        writeln!(f, "Failed checks:     {}", self.failed_checks)?;
        writeln!(f, "Uptime:            {:.2}%", self.uptime_percentage)?;

        if self.latency.samples > 0 {
            writeln!(f, "\nResponse times:")?;
            writeln!(f, "   Mean:   {:.2}ms", self.latency.mean_ms)?;
            writeln!(f, "   Median: {:.2}ms", self.latency.median_ms)?;
            writeln!(f, "   Min:    {:.2}ms", self.latency.min_ms)?;
            writeln!(f, "   Max:    {:.2}ms", self.latency.max_ms)?;
        }

        if self.downtime_event_count > 0 {
            writeln!(f, "\nDowntime events: {}", self.downtime_event_count)?;
            writeln!(f, "   First events:")?;
            for event in &self.first_downtime_events {
                writeln!(f, "   - {event}")?;
            }
            if self.remaining_events() > 0 {
                writeln!(f, "   ... and {} more events", self.remaining_events())?;
            }
        }

        writeln!(f, "{rule}")
    }
}
