use std::io::{self, Stdout, Write};

use chrono::{DateTime, Local};
use crossterm::style::{Color, Stylize, style};
use tracing::warn;

use super::{LogFile, ReportSink};
use crate::monitoring::stats::Summary;
use crate::monitoring::types::{ProbeOutcome, Verdict};

/// Terminal sink: colored status lines, the summary block and, if
/// configured, the log file.
pub struct ConsoleSink<W: Write = Stdout> {
    out: W,
    log: Option<LogFile>,
    json_summary: bool,
    color: bool,
}

impl ConsoleSink<Stdout> {
    pub fn stdout(log: Option<LogFile>, json_summary: bool) -> Self {
        Self::new(io::stdout(), log, json_summary, true)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, log: Option<LogFile>, json_summary: bool, color: bool) -> Self {
        Self { out, log, json_summary, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color { style(text).with(color).bold().to_string() } else { text.to_string() }
    }

    fn write_out(&mut self, text: &str) {
        let result = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!(error = %e, "Failed to write to terminal");
        }
    }

    fn render_summary(&self, summary: &Summary) -> String {
        match &self.log {
            Some(log) => format!("{summary}\nFull log saved to: {}\n", log.path().display()),
            None => summary.to_string(),
        }
    }
}

impl<W: Write> ReportSink for ConsoleSink<W> {
    fn emit_status(
        &mut self,
        at: DateTime<Local>,
        verdict: Verdict,
        outcome: &ProbeOutcome,
        threshold_ms: f64,
    ) {
        let (label, details) = match verdict {
            Verdict::Up => {
                (self.paint("UP", Color::Green), format!("({:.2}ms)", outcome.elapsed_ms))
            }
            Verdict::Slow => (
                self.paint("SLOW", Color::Yellow),
                format!("({:.2}ms > {}ms threshold)", outcome.elapsed_ms, threshold_ms),
            ),
            Verdict::Down => {
                let cause = outcome.error_text().unwrap_or_else(|| "Unknown error".to_string());
                let details = if outcome.elapsed_ms > 0.0 {
                    format!("{cause} (after {:.2}ms)", outcome.elapsed_ms)
                } else {
                    cause
                };
                (self.paint("DOWN", Color::Red), details)
            }
        };

        let line = format!("{} | {} {}\n", at.format("%H:%M:%S%.3f"), label, details);
        self.write_out(&line);
    }

    fn emit_log_line(&mut self, at: DateTime<Local>, label: &str, elapsed_ms: f64, detail: &str) {
        if let Some(log) = self.log.as_mut() {
            log.write_line(at, label, elapsed_ms, detail);
        }
    }

    fn emit_summary(&mut self, summary: &Summary) {
        let text = if self.json_summary {
            match serde_json::to_string_pretty(summary) {
                Ok(json) => format!("{json}\n"),
                Err(e) => {
                    warn!(error = %e, "Failed to serialize summary, falling back to text");
                    self.render_summary(summary)
                }
            }
        } else {
            self.render_summary(summary)
        };
        self.write_out(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::monitoring::stats::RunningStats;

    fn sink() -> ConsoleSink<Vec<u8>> {
        ConsoleSink::new(Vec::new(), None, false, false)
    }

    fn output(sink: ConsoleSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_status_lines_distinguish_verdicts() {
        let now = Local::now();
        let mut sink = sink();

        sink.emit_status(now, Verdict::Up, &ProbeOutcome::success(12.0), 100.0);
        sink.emit_status(now, Verdict::Slow, &ProbeOutcome::success(150.0), 100.0);
        sink.emit_status(
            now,
            Verdict::Down,
            &ProbeOutcome::failure(5000.0, ProbeError::Timeout),
            100.0,
        );

        let text = output(sink);
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].ends_with("| UP (12.00ms)"));
        assert!(lines[1].ends_with("| SLOW (150.00ms > 100ms threshold)"));
        assert!(lines[2].ends_with("| DOWN Timeout (after 5000.00ms)"));
    }

    #[test]
    fn test_summary_lists_first_five_events() {
        let now = Local::now();
        let mut stats = RunningStats::new(now);
        stats.record(Verdict::Up, 20.0, None, now);
        for i in 0..7 {
            stats.record(Verdict::Down, 0.0, Some(&format!("failure {i}")), now);
        }

        let mut sink = sink();
        sink.emit_summary(&stats.summarize(now));
        let text = output(sink);

        assert!(text.contains("Total checks:      8"));
        assert!(text.contains("Uptime:            12.50%"));
        assert!(text.contains("Median: 20.00ms"));
        assert!(text.contains("failure 4"));
        assert!(!text.contains("failure 5"));
        assert!(text.contains("... and 2 more events"));
    }

    #[test]
    fn test_summary_without_samples_omits_latency() {
        let now = Local::now();
        let mut sink = sink();
        sink.emit_summary(&RunningStats::new(now).summarize(now));

        let text = output(sink);
        assert!(text.contains("Uptime:            0.00%"));
        assert!(!text.contains("Response times"));
    }

    #[test]
    fn test_summary_points_at_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::open(dir.path().join("monitor.log")).unwrap();
        let now = Local::now();

        let mut sink = ConsoleSink::new(Vec::new(), Some(log), false, false);
        sink.emit_summary(&RunningStats::new(now).summarize(now));

        let text = output(sink);
        assert!(text.contains(&format!("{}\n\nFull log saved to: ", "=".repeat(60))));
        assert!(text.trim_end().ends_with("monitor.log"));
    }

    #[test]
    fn test_json_summary() {
        let now = Local::now();
        let mut stats = RunningStats::new(now);
        stats.record(Verdict::Up, 20.0, None, now);

        let mut sink = ConsoleSink::new(Vec::new(), None, true, false);
        sink.emit_summary(&stats.summarize(now));

        let value: serde_json::Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(value["total_checks"], 1);
        assert_eq!(value["uptime_percentage"], 100.0);
        assert_eq!(value["latency"]["max_ms"], 20.0);
    }
}
