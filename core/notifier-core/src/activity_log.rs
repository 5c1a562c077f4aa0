//! User-facing activity log.
//!
//! One line per completed dispatch, appended to `webhook-notification.log` and
//! trimmed to the newest [`MAX_LOG_LINES`] entries. This is the file users read
//! to see what the notifier did; diagnostics go through `tracing` instead.

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use fs_err as fs;
use fs_err::OpenOptions;

pub const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
    enabled: bool,
}

impl ActivityLog {
    pub fn new(path: PathBuf, enabled: bool) -> Self {
        Self { path, enabled }
    }

    /// Appends one timestamped entry. Failures are logged, never returned.
    pub fn record(&self, message: &str, now: DateTime<Utc>) {
        if !self.enabled {
            return;
        }

        if let Err(err) = self.append(message, now) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "Failed to append activity log"
            );
            return;
        }

        self.trim();
    }

    /// Deletes the log file. Returns true if a file was removed.
    pub fn clear(&self) -> std::io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn append(&self, message: &str, now: DateTime<Utc>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // Entries stay single-line so trimming by line count trims by entry.
        let single_line = message.replace('\n', " ");
        writeln!(
            file,
            "[{}] {}",
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
            single_line
        )
    }

    fn trim(&self) {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return;
        };

        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() <= MAX_LOG_LINES {
            return;
        }

        let mut trimmed = lines[lines.len() - MAX_LOG_LINES..].join("\n");
        trimmed.push('\n');
        let _ = fs::write(&self.path, trimmed);
    }
}
