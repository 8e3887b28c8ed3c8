/// Monitoring engine module - probes a single target on a fixed delay
///
/// This module is responsible for:
/// - Executing HTTP/TCP/ICMP checks
/// - Classifying results as up, slow or down
/// - Accumulating run statistics
/// - Driving the check loop until it is asked to stop
pub mod checker;
pub mod classifier;
pub mod scheduler;
pub mod stats;
pub mod types;

pub use checker::{CheckType, Checker, Prober};
pub use classifier::classify;
pub use scheduler::{LoopSettings, LoopState, MonitorLoop, stop_channel};
pub use stats::{RunningStats, Summary};
pub use types::{DowntimeEvent, ProbeOutcome, Verdict};
