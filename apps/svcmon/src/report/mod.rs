/// Reporting module - renders check results and the final summary
///
/// - `console`: live status lines and the summary block on stdout
/// - `log_file`: append-only text log of every check
pub mod console;
pub mod log_file;

use chrono::{DateTime, Local};

use crate::monitoring::stats::Summary;
use crate::monitoring::types::{ProbeOutcome, Verdict};

pub use console::ConsoleSink;
pub use log_file::LogFile;

/// Destination for everything the monitor loop has to say
pub trait ReportSink {
    /// One line per check
    fn emit_status(
        &mut self,
        at: DateTime<Local>,
        verdict: Verdict,
        outcome: &ProbeOutcome,
        threshold_ms: f64,
    );

    /// One log line; a no-op when no log destination is configured
    fn emit_log_line(&mut self, at: DateTime<Local>, label: &str, elapsed_ms: f64, detail: &str);

    /// Called exactly once, after the loop has stopped
    fn emit_summary(&mut self, summary: &Summary);
}

/// Millisecond-precision timestamp used by the log file and downtime events
pub fn log_timestamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Format a single log line, without trailing newline
pub fn format_log_line(at: DateTime<Local>, label: &str, elapsed_ms: f64, detail: &str) -> String {
    format!("[{}] {}: {:.2}ms - {}", log_timestamp(at), label, elapsed_ms, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_line_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            format_log_line(at, "SUCCESS", 12.345, "OK"),
            "[2024-03-09 14:05:07.000] SUCCESS: 12.35ms - OK"
        );
    }
}
