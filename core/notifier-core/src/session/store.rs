//! File-backed session record persistence.
//!
//! One JSON document per session at `<sessions_dir>/<session_id>.json`. Each hook
//! invocation is its own process, so this directory is the only memory shared
//! between a `UserPromptSubmit` and the `Stop` that follows it.
//!
//! # Defensive Design
//!
//! - Missing directory: reads see nothing, the first write creates it.
//! - Corrupt or unreadable record: treated as absent (logged, never fatal).
//! - Bulk listing skips entries whose metadata cannot be read.
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so a killed hook never leaves a half-written record.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fs_err as fs;
use walkdir::WalkDir;

use super::types::SessionRecord;
use crate::config::write_atomic;
use crate::error::{NotifierError, Result};

const RECORD_EXTENSION: &str = "json";

/// A record as seen by a directory scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub session_id: String,
    pub modified: SystemTime,
}

/// Keyed storage for [`SessionRecord`]s.
///
/// Kept narrow so the tracker never depends on the backing format.
pub trait SessionStore {
    /// Returns the record, or None if it is missing or unreadable.
    fn get(&self, session_id: &str) -> Option<SessionRecord>;

    fn put(&self, session_id: &str, record: &SessionRecord) -> Result<()>;

    /// Lists every record with its last-modified time. A missing backing
    /// directory is an empty list.
    fn list_all(&self) -> Result<Vec<StoredSession>>;

    /// Deletes a record. Deleting a missing record succeeds.
    fn delete(&self, session_id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self
            .dir
            .join(format!("{}.{}", session_id, RECORD_EXTENSION)))
    }
}

/// Session ids become file names, so anything that could escape the directory
/// is rejected.
fn validate_session_id(session_id: &str) -> Result<()> {
    let invalid = session_id.is_empty()
        || session_id == "."
        || session_id == ".."
        || session_id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(NotifierError::InvalidSessionId(session_id.to_string()));
    }
    Ok(())
}

impl SessionStore for FileSessionStore {
    fn get(&self, session_id: &str) -> Option<SessionRecord> {
        let path = match self.record_path(session_id) {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!(error = %err, "Refusing to read session record");
                return None;
            }
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read session record, treating as absent");
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&content) {
            Ok(mut record) => {
                if record.session_id.is_empty() {
                    record.session_id = session_id.to_string();
                }
                Some(record)
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Corrupt session record, treating as absent"
                );
                None
            }
        }
    }

    fn put(&self, session_id: &str, record: &SessionRecord) -> Result<()> {
        let path = self.record_path(session_id)?;
        let content = serde_json::to_string_pretty(record)
            .map_err(|e| NotifierError::json("Failed to serialize session record", e))?;
        write_atomic(&path, content.as_bytes())
            .map_err(|e| NotifierError::io(format!("Failed to write {}", path.display()), e))
    }

    fn list_all(&self) -> Result<Vec<StoredSession>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if err.depth() == 0 {
                        let context = format!("Failed to read {}", self.dir.display());
                        return Err(match err.into_io_error() {
                            Some(io) => NotifierError::io(context, io),
                            None => NotifierError::io(
                                context,
                                std::io::Error::new(std::io::ErrorKind::Other, "walk failed"),
                            ),
                        });
                    }
                    tracing::debug!(error = %err, "Skipping unreadable session entry");
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION)
            {
                continue;
            }

            let Some(session_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match entry.metadata().map(|m| m.modified()) {
                Ok(Ok(modified)) => sessions.push(StoredSession {
                    session_id: session_id.to_string(),
                    modified,
                }),
                Ok(Err(err)) => {
                    tracing::debug!(session = %session_id, error = %err, "Skipping session without mtime");
                }
                Err(err) => {
                    tracing::debug!(session = %session_id, error = %err, "Skipping session without metadata");
                }
            }
        }

        Ok(sessions)
    }

    fn delete(&self, session_id: &str) -> Result<()> {
        let path = self.record_path(session_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(NotifierError::io(
                format!("Failed to delete {}", path.display()),
                err,
            )),
        }
    }
}
