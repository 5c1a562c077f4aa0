//! Per-session lifecycle across independent hook invocations.
//!
//! ## State Machine
//!
//! ```text
//! New ──UserPromptSubmit──▶ Tracking ──Stop──▶ Stopped (record untouched)
//!                              │
//!                              └──SessionEnd──▶ Ended  (retention sweep)
//! ```
//!
//! Idle suppression is orthogonal to the lifecycle: the first `idle_prompt`
//! stamps `firstIdleNotificationTime`, and every idle prompt more than five
//! minutes after that stamp is suppressed for the rest of the record's life.
//! Nothing resets the stamp, not even a new task.

use chrono::{DateTime, Duration, Utc};

use super::store::SessionStore;
use super::types::SessionRecord;
use crate::event::is_unknown_session;

/// Upper bound on configured retention so the age arithmetic cannot overflow.
const MAX_RETENTION_DAYS: i64 = 36_500;

/// What a Stop event learns from the session record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopSnapshot {
    pub duration_secs: Option<u64>,
    pub project_path: Option<String>,
}

/// Results from a retention sweep or manual cleanup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepStats {
    /// Number of session records removed.
    pub deleted_count: u32,
    /// Number of records kept because they belong to the current session or are still active.
    pub skipped_count: u32,
    /// Per-record failures. A failure never stops the sweep.
    pub errors: Vec<String>,
}

pub struct SessionTracker<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> SessionTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Restarts the task clock for a session.
    ///
    /// Returns None without touching the store for the `"unknown"` placeholder.
    pub fn record_task_start(
        &self,
        session_id: &str,
        project_path: Option<&str>,
        now: DateTime<Utc>,
    ) -> crate::Result<Option<SessionRecord>> {
        if is_unknown_session(session_id) {
            tracing::debug!("Skipping task start for unknown session");
            return Ok(None);
        }

        let mut record = self
            .store
            .get(session_id)
            .unwrap_or_else(|| SessionRecord::new(session_id));
        record.session_id = session_id.to_string();
        record.task_start_time_epoch_seconds = Some(now.timestamp());
        if record.project_path.is_none() {
            record.project_path = project_path.map(str::to_string);
        }

        self.store.put(session_id, &record)?;
        tracing::debug!(session = %session_id, "Recorded task start");
        Ok(Some(record))
    }

    /// Reads the duration of the current task. Never writes.
    pub fn task_stopped(&self, session_id: &str, now: DateTime<Utc>) -> StopSnapshot {
        if is_unknown_session(session_id) {
            return StopSnapshot::default();
        }

        match self.store.get(session_id) {
            Some(record) => StopSnapshot {
                duration_secs: record.task_duration_secs(now),
                project_path: record.project_path,
            },
            None => StopSnapshot::default(),
        }
    }

    /// Decides whether an idle prompt should be swallowed, stamping the first
    /// idle time when none exists.
    ///
    /// Any storage failure answers "do not suppress".
    pub fn should_suppress_idle(&self, session_id: &str, now: DateTime<Utc>) -> bool {
        if is_unknown_session(session_id) {
            return false;
        }

        let mut record = match self.store.get(session_id) {
            Some(record) => record,
            None => SessionRecord::new(session_id),
        };

        if record.first_idle_notification_time_epoch_millis.is_some() {
            return record.idle_window_expired(now);
        }

        record.first_idle_notification_time_epoch_millis = Some(now.timestamp_millis());
        if let Err(err) = self.store.put(session_id, &record) {
            tracing::warn!(
                session = %session_id,
                error = %err,
                "Failed to stamp first idle notification"
            );
        }
        false
    }

    /// Deletes records older than `max_age_days`, except any whose id contains
    /// `current_session_id`.
    pub fn sweep(
        &self,
        max_age_days: u64,
        current_session_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> SweepStats {
        let days = i64::try_from(max_age_days)
            .unwrap_or(MAX_RETENTION_DAYS)
            .min(MAX_RETENTION_DAYS);
        let max_age = Duration::days(days);
        let current = current_session_id.filter(|id| !id.is_empty());
        self.remove_older_than(max_age, now, |session_id| {
            current.is_some_and(|current| session_id.contains(current))
        })
    }

    /// Deletes every record not modified within `keep_active`.
    pub fn clean_inactive(&self, keep_active: Duration, now: DateTime<Utc>) -> SweepStats {
        self.remove_older_than(keep_active, now, |_| false)
    }

    fn remove_older_than<F>(&self, max_age: Duration, now: DateTime<Utc>, protected: F) -> SweepStats
    where
        F: Fn(&str) -> bool,
    {
        let mut stats = SweepStats::default();

        let sessions = match self.store.list_all() {
            Ok(sessions) => sessions,
            Err(err) => {
                stats.errors.push(err.to_string());
                return stats;
            }
        };

        for session in sessions {
            if protected(&session.session_id) {
                stats.skipped_count += 1;
                continue;
            }

            let modified: DateTime<Utc> = session.modified.into();
            if now.signed_duration_since(modified) <= max_age {
                stats.skipped_count += 1;
                continue;
            }

            match self.store.delete(&session.session_id) {
                Ok(()) => stats.deleted_count += 1,
                Err(err) => stats
                    .errors
                    .push(format!("Failed to delete {}: {}", session.session_id, err)),
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifierError;
    use crate::session::store::{FileSessionStore, StoredSession};
    use std::sync::Mutex;
    use chrono::TimeZone;
    use fs_err as fs;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn tracker() -> (TempDir, SessionTracker<FileSessionStore>) {
        let temp = TempDir::new().unwrap();
        let store = FileSessionStore::new(&temp.path().join(".sessions"));
        (temp, SessionTracker::new(store))
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn set_age(tracker: &SessionTracker<FileSessionStore>, session_id: &str, age: Duration, now: DateTime<Utc>) {
        let path = tracker.store().record_path(session_id).unwrap();
        let mtime: SystemTime = (now - age).into();
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn stop_without_submit_has_no_duration_and_creates_nothing() {
        let (_temp, tracker) = tracker();

        let snapshot = tracker.task_stopped("abc", at(15));

        assert_eq!(snapshot.duration_secs, None);
        assert_eq!(tracker.store().get("abc"), None);
    }

    #[test]
    fn repeated_submit_resets_duration_baseline() {
        let (_temp, tracker) = tracker();

        tracker.record_task_start("abc", None, at(0)).unwrap();
        tracker.record_task_start("abc", None, at(10)).unwrap();

        assert_eq!(tracker.task_stopped("abc", at(15)).duration_secs, Some(5));
    }

    #[test]
    fn stop_does_not_mutate_record() {
        let (_temp, tracker) = tracker();
        tracker.record_task_start("abc", Some("/repo"), at(0)).unwrap();
        let before = tracker.store().get("abc");

        tracker.task_stopped("abc", at(30));

        assert_eq!(tracker.store().get("abc"), before);
    }

    #[test]
    fn project_path_is_sticky() {
        let (_temp, tracker) = tracker();

        tracker.record_task_start("abc", Some("/first"), at(0)).unwrap();
        tracker.record_task_start("abc", None, at(1)).unwrap();
        tracker.record_task_start("abc", Some("/second"), at(2)).unwrap();

        let snapshot = tracker.task_stopped("abc", at(3));
        assert_eq!(snapshot.project_path.as_deref(), Some("/first"));
    }

    #[test]
    fn unknown_session_is_never_persisted() {
        let (_temp, tracker) = tracker();

        let recorded = tracker.record_task_start("unknown", Some("/repo"), at(0)).unwrap();

        assert_eq!(recorded, None);
        assert!(!tracker.store().dir().exists());
        assert!(!tracker.should_suppress_idle("unknown", at(1_000)));
        assert!(!tracker.store().dir().exists());
    }

    #[test]
    fn idle_suppression_is_monotonic() {
        let (_temp, tracker) = tracker();
        let first = at(0);

        assert!(!tracker.should_suppress_idle("abc", first));
        assert!(!tracker.should_suppress_idle("abc", first + Duration::seconds(4 * 60 + 59)));
        assert!(tracker.should_suppress_idle("abc", first + Duration::seconds(5 * 60 + 1)));
        assert!(tracker.should_suppress_idle("abc", first + Duration::hours(3)));
    }

    #[test]
    fn first_idle_stamp_survives_new_task() {
        let (_temp, tracker) = tracker();
        let first = at(0);

        assert!(!tracker.should_suppress_idle("abc", first));
        tracker
            .record_task_start("abc", None, first + Duration::minutes(10))
            .unwrap();

        let record = tracker.store().get("abc").unwrap();
        assert_eq!(
            record.first_idle_notification_time_epoch_millis,
            Some(first.timestamp_millis())
        );
        assert!(tracker.should_suppress_idle("abc", first + Duration::minutes(11)));
    }

    #[test]
    fn idle_check_fails_open_on_unwritable_store() {
        let temp = TempDir::new().unwrap();
        // A regular file where the sessions directory should be makes every write fail.
        let blocker = temp.path().join(".sessions");
        fs::write(&blocker, "not a directory").unwrap();
        let tracker = SessionTracker::new(FileSessionStore::new(&blocker));

        assert!(!tracker.should_suppress_idle("abc", at(0)));
        assert!(!tracker.should_suppress_idle("abc", at(3_600)));
    }

    #[test]
    fn sweep_respects_age_and_current_session() {
        let (_temp, tracker) = tracker();
        let now = at(100 * 86_400);
        for id in ["old", "fresh", "current-session"] {
            tracker.store().put(id, &SessionRecord::new(id)).unwrap();
        }
        set_age(&tracker, "old", Duration::days(8), now);
        set_age(&tracker, "fresh", Duration::days(6), now);
        set_age(&tracker, "current-session", Duration::days(30), now);

        let stats = tracker.sweep(7, Some("current-session"), now);

        assert_eq!(stats.deleted_count, 1);
        assert_eq!(stats.skipped_count, 2);
        assert!(stats.errors.is_empty());
        assert_eq!(tracker.store().get("old"), None);
        assert!(tracker.store().get("fresh").is_some());
        assert!(tracker.store().get("current-session").is_some());
    }

    /// Lists a fixed set of records and refuses to delete one of them.
    struct StubbornStore {
        sessions: Vec<StoredSession>,
        undeletable: &'static str,
        deleted: Mutex<Vec<String>>,
    }

    impl SessionStore for StubbornStore {
        fn get(&self, _session_id: &str) -> Option<SessionRecord> {
            None
        }

        fn put(&self, _session_id: &str, _record: &SessionRecord) -> crate::Result<()> {
            Ok(())
        }

        fn list_all(&self) -> crate::Result<Vec<StoredSession>> {
            Ok(self.sessions.clone())
        }

        fn delete(&self, session_id: &str) -> crate::Result<()> {
            if session_id == self.undeletable {
                return Err(NotifierError::io(
                    "Failed to remove record",
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                ));
            }
            self.deleted.lock().unwrap().push(session_id.to_string());
            Ok(())
        }
    }

    #[test]
    fn sweep_continues_past_a_failed_delete() {
        let now = at(0);
        let modified: SystemTime = (now - Duration::days(30)).into();
        let sessions = ["a", "bad", "c"]
            .iter()
            .map(|id| StoredSession {
                session_id: id.to_string(),
                modified,
            })
            .collect();
        let tracker = SessionTracker::new(StubbornStore {
            sessions,
            undeletable: "bad",
            deleted: Mutex::new(Vec::new()),
        });

        let stats = tracker.sweep(7, None, now);

        assert_eq!(stats.deleted_count, 2);
        assert_eq!(stats.skipped_count, 0);
        assert_eq!(stats.errors.len(), 1);
        assert!(stats.errors[0].contains("bad"));
        assert_eq!(*tracker.store().deleted.lock().unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn sweep_of_missing_directory_is_a_no_op() {
        let (_temp, tracker) = tracker();
        assert_eq!(tracker.sweep(7, Some("abc"), at(0)), SweepStats::default());
    }

    #[test]
    fn clean_inactive_keeps_recent_sessions() {
        let (_temp, tracker) = tracker();
        let now = at(10_000);
        tracker.store().put("busy", &SessionRecord::new("busy")).unwrap();
        tracker.store().put("idle", &SessionRecord::new("idle")).unwrap();
        set_age(&tracker, "busy", Duration::minutes(5), now);
        set_age(&tracker, "idle", Duration::minutes(45), now);

        let stats = tracker.clean_inactive(Duration::minutes(30), now);

        assert_eq!(stats.deleted_count, 1);
        assert_eq!(stats.skipped_count, 1);
        assert!(tracker.store().get("busy").is_some());
    }
}
