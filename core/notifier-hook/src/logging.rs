//! Diagnostic logging to a daily-rolling file.
//!
//! Claude Code reads hook stdout/stderr, so diagnostics never go there. The
//! writer is non-blocking; the returned guard flushes it on drop and must live
//! until the process exits.

use std::env;

use fs_err as fs;
use notifier_core::StorageConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "notifier-hook.log";

fn debug_forced() -> bool {
    env::var("NOTIFIER_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

/// Installs the global subscriber. Returns None, leaving tracing as a no-op,
/// if the log directory cannot be created.
pub fn init(storage: &StorageConfig) -> Option<WorkerGuard> {
    let dir = storage.diagnostics_dir();
    if fs::create_dir_all(&dir).is_err() {
        return None;
    }

    let filter = if debug_forced() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}
