//! Append-only session log.
//!
//! Every finished session is recorded with its goal, start timestamp, and
//! final summary so operators can review what previous runs accomplished.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fixed read-back value when no log file exists yet.
pub const NO_SESSIONS_SENTINEL: &str = "No previous sessions";

/// Delimiter line written between session records.
const RECORD_DELIMITER: &str = "---";

/// Handle to the on-disk session log.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log at the default location, `~/.termpilot/sessions.log`.
    pub fn default_location() -> Self {
        let path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".termpilot")
            .join("sessions.log");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one end-of-session record.
    pub fn append(&self, goal: &str, started_at: DateTime<Utc>, summary: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open session log: {}", self.path.display()))?;

        writeln!(
            file,
            "Goal: {goal}\nStarted: {}\nSummary: {summary}\n{RECORD_DELIMITER}",
            started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .context("Failed to write session record")?;

        Ok(())
    }

    /// Return the full log content verbatim, or the fixed sentinel if no
    /// sessions have been recorded.
    pub fn read_back(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(NO_SESSIONS_SENTINEL.to_string());
        }
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session log: {}", self.path.display()))
    }
}
