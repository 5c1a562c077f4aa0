//! Storage configuration and path management for the notifier.
//!
//! Every file the notifier touches is named here so components receive their
//! paths at construction instead of reaching for `~` themselves.
//!
//! ## Layout
//!
//! ```text
//! ~/.claude/
//! ├── .sessions/<session-id>.json     per-session records
//! ├── webhook-config.json             user configuration
//! ├── webhook-notification.log        bounded activity log
//! ├── settings.json                   Claude Code settings (hooks live here)
//! └── notifier/logs/                  diagnostic tracing output
//! ```

use std::path::{Path, PathBuf};

use crate::error::{NotifierError, Result};

/// Central configuration for all notifier storage paths.
///
/// Production code uses [`StorageConfig::from_home`], which points at `~/.claude/`.
/// Tests use [`StorageConfig::with_root`] for isolation.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves the storage root from the user's home directory.
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or(NotifierError::HomeDirNotFound)?;
        Ok(Self {
            root: home.join(".claude"),
        })
    }

    /// Creates a StorageConfig with a custom root directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the root directory (normally `~/.claude`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to webhook-config.json (user configuration).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("webhook-config.json")
    }

    /// Path to the user-facing activity log.
    pub fn activity_log_file(&self) -> PathBuf {
        self.root.join("webhook-notification.log")
    }

    /// Path to Claude Code's settings.json.
    pub fn claude_settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to the per-session record directory.
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join(".sessions")
    }

    /// Path to the diagnostic log directory.
    pub fn diagnostics_dir(&self) -> PathBuf {
        self.root.join("notifier").join("logs")
    }
}
