//! Error types for notifier-core operations.
//!
//! Hook invocations must never fail the calling pipeline, so most of these are
//! logged and swallowed at the edges. They exist so the log says what broke.

use std::path::PathBuf;

/// All errors that can occur in notifier-core operations.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration write failed: {path}: {source}")]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file malformed: {path}: {details}")]
    SettingsMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Session Store Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    // ─────────────────────────────────────────────────────────────────────
    // Channel Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Webhook {kind} is misconfigured: {reason}")]
    WebhookMisconfigured { kind: String, reason: String },

    #[error("Webhook {kind} returned HTTP {status}")]
    WebhookStatus { kind: String, status: u16 },

    #[error("Webhook {kind} request failed: {source}")]
    WebhookTransport {
        kind: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Command execution failed: {command}: {details}")]
    CommandFailed { command: String, details: String },

    #[error("Channel {channel} timed out after {secs}s")]
    ChannelTimeout { channel: String, secs: u64 },

    #[error("Channel {channel} task aborted: {details}")]
    ChannelAborted { channel: String, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl NotifierError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        NotifierError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        NotifierError::Json {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using NotifierError.
pub type Result<T> = std::result::Result<T, NotifierError>;

impl From<NotifierError> for String {
    fn from(err: NotifierError) -> String {
        err.to_string()
    }
}
