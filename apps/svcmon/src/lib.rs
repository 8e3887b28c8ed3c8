//! Availability monitor for a single target.
//!
//! A [`monitoring::MonitorLoop`] repeatedly runs one [`monitoring::Checker`]
//! against the target, classifies each result and hands it to a
//! [`report::ReportSink`]. The summary is emitted once when the loop stops.

pub mod cli;
pub mod config;
pub mod error;
pub mod monitoring;
pub mod report;

pub use error::{ConfigError, MonitorError, ProbeError};
