//! One hook invocation, end to end.
//!
//! ```text
//! HookEvent ──▶ SessionTracker ──▶ decide() ──▶ Fanout ──▶ ActivityLog
//! ```
//!
//! The engine never returns an error: every failure is logged and folded into
//! the [`HandleOutcome`] so the hook process can always exit cleanly.

use chrono::{DateTime, Utc};

use crate::activity_log::ActivityLog;
use crate::config::{NotifierConfig, IDLE_PROMPT};
use crate::dispatch::{
    check_prompt_eligible, decide, session_prefix, Decision, DecisionInput, DispatchReport,
    Fanout, SkipReason, SESSION_PREFIX_LEN,
};
use crate::event::{is_unknown_session, HookEvent};
use crate::session::{FileSessionStore, SessionStore, SessionTracker, SweepStats};
use crate::storage::StorageConfig;

#[derive(Debug)]
pub enum HandleOutcome {
    /// A task start was written to the session record.
    Recorded,
    /// Nothing to do (placeholder session id or a storage failure).
    Ignored,
    Dispatched(DispatchReport),
    Skipped(SkipReason),
    Swept(SweepStats),
}

pub struct HookEngine<S: SessionStore = FileSessionStore> {
    config: NotifierConfig,
    tracker: SessionTracker<S>,
    activity: ActivityLog,
    fanout: Fanout,
}

impl HookEngine<FileSessionStore> {
    pub fn new(storage: &StorageConfig, config: NotifierConfig, fanout: Fanout) -> Self {
        let tracker = SessionTracker::new(FileSessionStore::new(&storage.sessions_dir()));
        let activity = ActivityLog::new(storage.activity_log_file(), config.enable_logging);
        Self::with_parts(config, tracker, activity, fanout)
    }
}

impl<S: SessionStore> HookEngine<S> {
    pub fn with_parts(
        config: NotifierConfig,
        tracker: SessionTracker<S>,
        activity: ActivityLog,
        fanout: Fanout,
    ) -> Self {
        Self {
            config,
            tracker,
            activity,
            fanout,
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    pub fn tracker(&self) -> &SessionTracker<S> {
        &self.tracker
    }

    pub async fn handle(&self, event: HookEvent, now: DateTime<Utc>) -> HandleOutcome {
        tracing::debug!(event = event.name(), session = %event.session_id(), "Handling hook event");

        match event {
            HookEvent::TaskSubmitted {
                session_id,
                project_path,
                cwd,
            } => {
                let project_path = project_path.or(cwd);
                match self
                    .tracker
                    .record_task_start(&session_id, project_path.as_deref(), now)
                {
                    Ok(Some(_)) => HandleOutcome::Recorded,
                    Ok(None) => HandleOutcome::Ignored,
                    Err(err) => {
                        tracing::warn!(session = %session_id, error = %err, "Failed to record task start");
                        HandleOutcome::Ignored
                    }
                }
            }

            HookEvent::TaskStopped {
                session_id,
                stop_reason,
                project_path,
                ..
            } => {
                let snapshot = self.tracker.task_stopped(&session_id, now);
                let project_path = project_path.or(snapshot.project_path);
                let input = DecisionInput::TaskStopped {
                    session_id: &session_id,
                    stop_reason: &stop_reason,
                    duration_secs: snapshot.duration_secs,
                    project_path: project_path.as_deref(),
                };
                self.run("Stop", &session_id, &input, now).await
            }

            HookEvent::PromptNotification {
                session_id,
                notification_type,
                message,
                cwd,
            } => {
                // Gate first so a disabled type never stamps the idle window.
                if let Err(reason) = check_prompt_eligible(&self.config, &notification_type) {
                    tracing::debug!(session = %session_id, reason = %reason, "Notification skipped");
                    return HandleOutcome::Skipped(reason);
                }

                let idle_suppressed = notification_type == IDLE_PROMPT
                    && self.tracker.should_suppress_idle(&session_id, now);
                let input = DecisionInput::Prompt {
                    session_id: &session_id,
                    notification_type: &notification_type,
                    message: message.as_deref(),
                    project_path: cwd.as_deref(),
                    idle_suppressed,
                };
                self.run("Notification", &session_id, &input, now).await
            }

            HookEvent::SessionEnded { session_id, .. } => {
                if !self.config.enable_session_cleanup {
                    return HandleOutcome::Skipped(SkipReason::CleanupDisabled);
                }

                let current = Some(session_id.as_str()).filter(|id| !is_unknown_session(id));
                let stats = self
                    .tracker
                    .sweep(self.config.session_cleanup_days, current, now);
                for err in &stats.errors {
                    tracing::warn!(error = %err, "Session sweep error");
                }
                if stats.deleted_count > 0 {
                    self.activity.record(
                        &format!(
                            "Session cleanup: removed {} records older than {} days",
                            stats.deleted_count, self.config.session_cleanup_days
                        ),
                        now,
                    );
                }
                tracing::info!(
                    deleted = stats.deleted_count,
                    skipped = stats.skipped_count,
                    errors = stats.errors.len(),
                    "Session sweep complete"
                );
                HandleOutcome::Swept(stats)
            }
        }
    }

    async fn run(
        &self,
        event_name: &str,
        session_id: &str,
        input: &DecisionInput<'_>,
        now: DateTime<Utc>,
    ) -> HandleOutcome {
        let prefix = session_prefix(session_id, SESSION_PREFIX_LEN);

        let decision = match decide(input, &self.config) {
            Decision::Dispatch(decision) => decision,
            Decision::Skip(reason) => {
                if matches!(reason, SkipReason::BelowMinDuration { .. }) {
                    self.activity.record(
                        &format!("{} {}: skipped: {}", event_name, prefix, reason),
                        now,
                    );
                }
                tracing::debug!(session = %session_id, reason = %reason, "Dispatch skipped");
                return HandleOutcome::Skipped(reason);
            }
        };

        let report = self.fanout.dispatch(&decision, now).await;

        self.activity.record(
            &format!(
                "{} {}: {} - {} ({}/{} channels delivered)",
                event_name,
                prefix,
                decision.payload.title,
                decision.payload.status,
                report.succeeded(),
                report.outcomes.len()
            ),
            now,
        );
        for failure in report.failed() {
            if let Err(err) = &failure.result {
                self.activity
                    .record(&format!("{} failed: {}", failure.channel, err), now);
            }
        }

        HandleOutcome::Dispatched(report)
    }
}
