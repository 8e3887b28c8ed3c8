#![warn(clippy::all, clippy::pedantic)]

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use svcmon::cli::Cli;
use svcmon::config::{FileConfig, MonitorConfig};
use svcmon::monitoring::{LoopSettings, MonitorLoop, Prober, stop_channel};
use svcmon::report::{ConsoleSink, LogFile};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_tracing(logger::level_from_verbosity(cli.verbose));

    let file = FileConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let config = MonitorConfig::resolve(&cli, file).context("Invalid configuration")?;

    let prober = Prober::new(config.check_type, config.timeout, config.verify_tls)
        .context("Failed to set up checker")?;
    info!(check_type = %prober.check_type(), address = %config.target, "Checker ready");

    let log = config
        .log_file
        .as_ref()
        .map(LogFile::open)
        .transpose()
        .context("Failed to open log file")?;

    if !config.json_summary {
        println!("{config}");
    }

    let (stop_tx, stop_rx) = stop_channel();
    tokio::spawn(watch_for_interrupt(stop_tx));

    let settings = LoopSettings {
        target: config.target.clone(),
        interval: config.interval,
        threshold_ms: config.threshold_ms,
    };
    let sink = ConsoleSink::stdout(log, config.json_summary);

    MonitorLoop::new(prober, sink, settings, stop_rx)
        .run()
        .await
        .context("Monitoring aborted")?;

    Ok(())
}

/// First Ctrl+C stops after the check in flight; a second one exits at once.
async fn watch_for_interrupt(stop_tx: watch::Sender<bool>) {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    eprintln!("\nStopping monitor (press Ctrl+C again to quit immediately)...");
    let _ = stop_tx.send(true);

    if signal::ctrl_c().await.is_ok() {
        std::process::exit(130);
    }
}
