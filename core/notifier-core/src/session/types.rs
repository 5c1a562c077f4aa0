//! Serialized per-session record.
//!
//! On-disk field names are camelCase and match files written by earlier
//! versions of the notifier (`taskStartTime` is epoch seconds,
//! `firstIdleNotificationTime` is epoch milliseconds).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Idle prompts later than this after the first one are suppressed.
pub const IDLE_SUPPRESSION_WINDOW_MS: i64 = 5 * 60 * 1000; // 5 minutes

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Records created by an idle prompt historically lacked this field; the
    /// store fills it from the file name on read.
    #[serde(default)]
    pub session_id: String,
    /// Start of the most recent task. Overwritten by every submit.
    #[serde(
        rename = "taskStartTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub task_start_time_epoch_seconds: Option<i64>,
    /// Sticky once set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    /// Set once on the first idle prompt, never reset while the file lives.
    #[serde(
        rename = "firstIdleNotificationTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub first_idle_notification_time_epoch_millis: Option<i64>,
}

impl SessionRecord {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            ..Self::default()
        }
    }

    /// Seconds since the latest task started, or None if no task was ever recorded.
    pub fn task_duration_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        let start = self.task_start_time_epoch_seconds?;
        Some(now.timestamp().saturating_sub(start).max(0) as u64)
    }

    /// Returns true if an idle prompt at `now` falls outside the suppression window.
    pub fn idle_window_expired(&self, now: DateTime<Utc>) -> bool {
        match self.first_idle_notification_time_epoch_millis {
            Some(first) => now.timestamp_millis().saturating_sub(first) > IDLE_SUPPRESSION_WINDOW_MS,
            None => false,
        }
    }
}
