//! Decides whether an event notifies anyone, which channels fire, and what
//! they say.
//!
//! Pure: no I/O, no clock. The engine gathers session state first and hands the
//! facts in as a [`DecisionInput`].

use std::fmt;

use crate::config::{NotifierConfig, WebhookConfig, IDLE_PROMPT};

/// Session id prefix length used in webhook payloads and the activity log.
pub const SESSION_PREFIX_LEN: usize = 16;
/// Session id prefix length used in compact desktop notification bodies.
pub const COMPACT_SESSION_PREFIX_LEN: usize = 8;

pub const TASK_COMPLETE_TITLE: &str = "Task Completed";
pub const DEFAULT_PROMPT_MESSAGE: &str = "Action required";

/// Case-sensitive substring check on `"error"`. Nothing smarter: a stop reason
/// of `"Error"` is a success.
pub fn contains_error_marker(text: &str) -> bool {
    text.contains("error")
}

/// First `len` characters of a session id.
pub fn session_prefix(session_id: &str, len: usize) -> &str {
    match session_id.char_indices().nth(len) {
        Some((idx, _)) => &session_id[..idx],
        None => session_id,
    }
}

/// Human label for a Claude Code notification type. Unknown types pass through.
pub fn notification_label(notification_type: &str) -> &str {
    match notification_type {
        "permission_prompt" => "Permission Request",
        "idle_prompt" => "Waiting for Input",
        "auth_success" => "Authentication Succeeded",
        "elicitation_dialog" => "MCP Input",
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TaskComplete,
    Prompt,
}

/// Normalized content handed to every channel. Webhook providers format this;
/// they never see the raw event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub kind: NotificationKind,
    pub title: String,
    pub status: String,
    pub is_error: bool,
    pub duration_secs: Option<u64>,
    pub project_path: Option<String>,
    pub session_id_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopContent {
    pub title: String,
    pub body: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelTarget {
    Desktop,
    Voice,
    Terminal,
    Webhook(WebhookConfig),
}

impl ChannelTarget {
    pub fn label(&self) -> String {
        match self {
            ChannelTarget::Desktop => "desktop".to_string(),
            ChannelTarget::Voice => "voice".to_string(),
            ChannelTarget::Terminal => "terminal".to_string(),
            ChannelTarget::Webhook(webhook) => format!("webhook:{}", webhook.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchDecision {
    pub targets: Vec<ChannelTarget>,
    pub payload: NotificationPayload,
    pub desktop: DesktopContent,
    pub speech: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    BelowMinDuration { duration_secs: u64, min_duration: u64 },
    NotificationHookDisabled,
    NotificationTypeDisabled(String),
    IdleSuppressed,
    CleanupDisabled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::BelowMinDuration {
                duration_secs,
                min_duration,
            } => write!(
                f,
                "task took {}s, below the {}s threshold",
                duration_secs, min_duration
            ),
            SkipReason::NotificationHookDisabled => f.write_str("notification hook disabled"),
            SkipReason::NotificationTypeDisabled(kind) => {
                write!(f, "notification type {:?} not enabled", kind)
            }
            SkipReason::IdleSuppressed => f.write_str("idle prompt suppressed"),
            SkipReason::CleanupDisabled => f.write_str("session cleanup disabled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Dispatch(DispatchDecision),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionInput<'a> {
    TaskStopped {
        session_id: &'a str,
        stop_reason: &'a str,
        duration_secs: Option<u64>,
        project_path: Option<&'a str>,
    },
    Prompt {
        session_id: &'a str,
        notification_type: &'a str,
        message: Option<&'a str>,
        project_path: Option<&'a str>,
        idle_suppressed: bool,
    },
}

/// Checks the configuration gates for a prompt notification.
///
/// Runs before idle suppression so a disabled type never stamps the session.
pub fn check_prompt_eligible(
    config: &NotifierConfig,
    notification_type: &str,
) -> Result<(), SkipReason> {
    if !config.enable_notification_hook {
        return Err(SkipReason::NotificationHookDisabled);
    }
    if !config.notification_type_enabled(notification_type) {
        return Err(SkipReason::NotificationTypeDisabled(
            notification_type.to_string(),
        ));
    }
    Ok(())
}

pub fn decide(input: &DecisionInput<'_>, config: &NotifierConfig) -> Decision {
    match *input {
        DecisionInput::TaskStopped {
            session_id,
            stop_reason,
            duration_secs,
            project_path,
        } => {
            if let Some(duration) = duration_secs {
                if duration < config.min_duration {
                    return Decision::Skip(SkipReason::BelowMinDuration {
                        duration_secs: duration,
                        min_duration: config.min_duration,
                    });
                }
            }

            let is_error = contains_error_marker(stop_reason);
            let payload = NotificationPayload {
                kind: NotificationKind::TaskComplete,
                title: TASK_COMPLETE_TITLE.to_string(),
                status: stop_reason.to_string(),
                is_error,
                duration_secs,
                project_path: project_path.map(str::to_string),
                session_id_prefix: session_prefix(session_id, SESSION_PREFIX_LEN).to_string(),
            };

            let desktop = DesktopContent {
                title: if is_error {
                    format!("⚠️ {} (with errors)", TASK_COMPLETE_TITLE)
                } else {
                    format!("✅ {}", TASK_COMPLETE_TITLE)
                },
                body: format!(
                    "Session: {}...{}",
                    session_prefix(session_id, COMPACT_SESSION_PREFIX_LEN),
                    duration_secs
                        .map(|d| format!(" Took {}s", d))
                        .unwrap_or_default()
                ),
                is_error,
            };

            let speech = match duration_secs {
                Some(d) => format!("Task completed, took {} seconds", d),
                None => "Task completed".to_string(),
            };

            Decision::Dispatch(DispatchDecision {
                targets: targets_for(config),
                payload,
                desktop,
                speech,
            })
        }

        DecisionInput::Prompt {
            session_id,
            notification_type,
            message,
            project_path,
            idle_suppressed,
        } => {
            if let Err(reason) = check_prompt_eligible(config, notification_type) {
                return Decision::Skip(reason);
            }
            if notification_type == IDLE_PROMPT && idle_suppressed {
                return Decision::Skip(SkipReason::IdleSuppressed);
            }

            let label = notification_label(notification_type);
            let message = message.unwrap_or(DEFAULT_PROMPT_MESSAGE);
            let is_error = contains_error_marker(message);

            let payload = NotificationPayload {
                kind: NotificationKind::Prompt,
                title: label.to_string(),
                status: message.to_string(),
                is_error,
                duration_secs: None,
                project_path: project_path.map(str::to_string),
                session_id_prefix: session_prefix(session_id, SESSION_PREFIX_LEN).to_string(),
            };

            let desktop = DesktopContent {
                title: format!("Claude Code {}", label),
                body: message.to_string(),
                is_error,
            };

            Decision::Dispatch(DispatchDecision {
                targets: targets_for(config),
                payload,
                desktop,
                speech: format!("Claude Code: {}", label),
            })
        }
    }
}

/// Each category is gated by its own toggle; disabled webhooks never appear.
fn targets_for(config: &NotifierConfig) -> Vec<ChannelTarget> {
    let mut targets = Vec::new();
    if config.enable_system_notification {
        targets.push(ChannelTarget::Desktop);
    }
    if config.enable_voice {
        targets.push(ChannelTarget::Voice);
    }
    if config.auto_activate_window {
        targets.push(ChannelTarget::Terminal);
    }
    targets.extend(
        config
            .enabled_webhooks()
            .cloned()
            .map(ChannelTarget::Webhook),
    );
    targets
}
