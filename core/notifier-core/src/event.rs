//! Hook payload classification.
//!
//! Claude Code delivers one JSON object per hook invocation on stdin. Only four
//! `hook_event_name` values matter here:
//!
//! ```text
//! UserPromptSubmit → TaskSubmitted       (records the task start)
//! Stop             → TaskStopped         (task-complete notification)
//! Notification     → PromptNotification  (permission / idle prompts)
//! SessionEnd       → SessionEnded        (retention sweep)
//! ```
//!
//! Anything else, and anything that is not JSON, is a [`ClassifyError`]. Callers
//! treat every classification error as "ignore silently": the caller may send
//! events this tool does not know yet.

use serde::Deserialize;
use thiserror::Error;

/// Placeholder used when a recognized event arrives without a session id.
/// Session state is never persisted under this id.
pub const UNKNOWN_SESSION_ID: &str = "unknown";

const DEFAULT_STOP_REASON: &str = "completed";

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Empty hook payload")]
    Empty,

    #[error("Malformed hook payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unhandled hook event: {0:?}")]
    UnknownEvent(Option<String>),
}

/// Raw hook payload as Claude Code sends it. All fields optional; the event
/// name decides which ones matter.
#[derive(Debug, Default, Deserialize)]
struct HookInput {
    #[serde(default)]
    hook_event_name: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    project_path: Option<String>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    tool_calls: Option<u64>,
    #[serde(default)]
    notification_type: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    TaskSubmitted {
        session_id: String,
        project_path: Option<String>,
        cwd: Option<String>,
    },
    TaskStopped {
        session_id: String,
        stop_reason: String,
        project_path: Option<String>,
        tool_calls: Option<u64>,
    },
    SessionEnded {
        session_id: String,
        reason: Option<String>,
    },
    PromptNotification {
        session_id: String,
        notification_type: String,
        message: Option<String>,
        cwd: Option<String>,
    },
}

impl HookEvent {
    pub fn session_id(&self) -> &str {
        match self {
            HookEvent::TaskSubmitted { session_id, .. }
            | HookEvent::TaskStopped { session_id, .. }
            | HookEvent::SessionEnded { session_id, .. }
            | HookEvent::PromptNotification { session_id, .. } => session_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HookEvent::TaskSubmitted { .. } => "UserPromptSubmit",
            HookEvent::TaskStopped { .. } => "Stop",
            HookEvent::SessionEnded { .. } => "SessionEnd",
            HookEvent::PromptNotification { .. } => "Notification",
        }
    }
}

pub fn is_unknown_session(session_id: &str) -> bool {
    session_id.is_empty() || session_id == UNKNOWN_SESSION_ID
}

/// Classifies one raw hook payload.
pub fn classify(raw: &[u8]) -> Result<HookEvent, ClassifyError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(ClassifyError::Empty);
    }

    let input: HookInput = serde_json::from_slice(raw)?;
    let session_id = input
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| UNKNOWN_SESSION_ID.to_string());

    match input.hook_event_name.as_deref() {
        Some("UserPromptSubmit") => Ok(HookEvent::TaskSubmitted {
            session_id,
            project_path: input.project_path,
            cwd: input.cwd,
        }),
        Some("Stop") => Ok(HookEvent::TaskStopped {
            session_id,
            stop_reason: input
                .stop_reason
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_STOP_REASON.to_string()),
            project_path: input.project_path,
            tool_calls: input.tool_calls,
        }),
        Some("SessionEnd") => Ok(HookEvent::SessionEnded {
            session_id,
            reason: input.reason,
        }),
        Some("Notification") => Ok(HookEvent::PromptNotification {
            session_id,
            notification_type: input.notification_type.unwrap_or_default(),
            message: input.message.filter(|m| !m.is_empty()),
            cwd: input.cwd,
        }),
        _ => Err(ClassifyError::UnknownEvent(input.hook_event_name)),
    }
}
