use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::warn;

use super::format_log_line;
use crate::error::MonitorError;

/// Append-only log file. Lines are flushed as they are written so the file
/// stays useful if the process is killed.
pub struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    /// Open (or create) the file for appending, creating missing parent
    /// directories. Failing here ends the run before the first check.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, at: DateTime<Local>, label: &str, elapsed_ms: f64, detail: &str) {
        let line = format_log_line(at, label, elapsed_ms, detail);
        let result = writeln!(self.file, "{line}").and_then(|_| self.file.flush());
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to write log line");
        }
    }
}
