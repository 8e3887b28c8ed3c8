use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::checker::Checker;
use super::classifier::classify;
use super::stats::{RunningStats, Summary};
use super::types::Verdict;
use crate::error::MonitorError;
use crate::report::ReportSink;

/// Settings the loop needs for every tick
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub target: String,
    pub interval: Duration,
    pub threshold_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Terminated,
}

/// Create a stop channel. Sending `true` asks the loop to stop at its next checkpoint.
pub fn stop_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Sequential probe loop for a single target.
///
/// Each tick runs check, classify, record, report and then sleeps for the
/// full interval, so the real period is probe latency plus interval. A stop
/// request is only honoured between ticks; a check in flight always completes
/// and is recorded.
pub struct MonitorLoop<C, S> {
    checker: C,
    sink: S,
    settings: LoopSettings,
    stats: RunningStats,
    state: LoopState,
    stop_rx: watch::Receiver<bool>,
}

impl<C: Checker, S: ReportSink> MonitorLoop<C, S> {
    pub fn new(checker: C, sink: S, settings: LoopSettings, stop_rx: watch::Receiver<bool>) -> Self {
        Self {
            checker,
            sink,
            settings,
            stats: RunningStats::new(Local::now()),
            state: LoopState::Running,
            stop_rx,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run until stopped, then emit the summary exactly once.
    ///
    /// Returns the summary, or the fatal error that ended the run. The summary
    /// is emitted on both paths.
    pub async fn run(&mut self) -> Result<Summary, MonitorError> {
        info!(address = %self.settings.target, "Monitoring started");

        let result = self.drive().await;
        if let Err(e) = &result {
            error!(error = %e, "Monitoring aborted");
        }
        self.state = LoopState::Stopping;

        let summary = self.stats.summarize(Local::now());
        self.sink.emit_summary(&summary);
        self.state = LoopState::Terminated;

        info!(
            total = summary.total_checks,
            failed = summary.failed_checks,
            uptime = summary.uptime_percentage,
            "Monitoring stopped"
        );

        result.map(|()| summary)
    }

    fn stop_requested(&self) -> bool {
        *self.stop_rx.borrow()
    }

    async fn drive(&mut self) -> Result<(), MonitorError> {
        while !self.stop_requested() {
            self.tick().await?;
            self.pause().await;
        }
        debug!("Stop requested");
        Ok(())
    }

    async fn tick(&mut self) -> Result<Verdict, MonitorError> {
        let outcome = self.checker.check(&self.settings.target).await?;
        let verdict = classify(&outcome, self.settings.threshold_ms);
        let error_text = outcome.error_text();
        let now = Local::now();

        self.stats.record(verdict, outcome.elapsed_ms, error_text.as_deref(), now);
        debug!(%verdict, elapsed_ms = outcome.elapsed_ms, error = ?error_text, "Check completed");

        self.sink.emit_status(now, verdict, &outcome, self.settings.threshold_ms);

        let detail = error_text.as_deref().unwrap_or("OK");
        if verdict == Verdict::Down {
            self.sink.emit_log_line(now, "DOWNTIME", outcome.elapsed_ms, detail);
        }
        self.sink.emit_log_line(now, verdict.log_label(), outcome.elapsed_ms, detail);

        Ok(verdict)
    }

    /// Sleep for the interval, waking early if a stop is requested.
    async fn pause(&mut self) {
        let interval = self.settings.interval;
        let stop_rx = &mut self.stop_rx;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = async {
                // A dropped sender can never ask us to stop.
                if stop_rx.wait_for(|stop| *stop).await.is_err() {
                    std::future::pending::<()>().await;
                }
            } => {}
        }
    }
}
