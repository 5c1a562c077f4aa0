//! Event handler for Claude Code hooks.
//!
//! Reads one JSON payload from stdin, classifies it, and runs the engine once.
//! Anything this tool does not understand is dropped quietly: the caller must
//! never see a failing hook because of the notifier.

use chrono::Utc;
use notifier_core::{
    classify, config_exists, load_config, save_config, Fanout, HandleOutcome, HookEngine,
    HookEvent, HttpWebhookSender, NotifierConfig, StorageConfig, SystemNotifier,
};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

pub async fn run(storage: &StorageConfig) -> Result<(), String> {
    let mut input = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut input)
        .await
        .map_err(|e| format!("Failed to read stdin: {}", e))?;

    handle_payload(storage, &input).await
}

/// Handles one raw hook payload against `storage`.
pub async fn handle_payload(storage: &StorageConfig, raw: &[u8]) -> Result<(), String> {
    let event = match classify(raw) {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(error = %err, "Ignoring hook payload");
            return Ok(());
        }
    };

    // First run: a Stop with no config writes the defaults and stops there.
    if matches!(event, HookEvent::TaskStopped { .. }) && !config_exists(storage) {
        save_config(storage, &NotifierConfig::default())?;
        tracing::info!(
            path = %storage.config_file().display(),
            "Wrote default configuration"
        );
        return Ok(());
    }

    let config = load_config(storage);
    let sender = HttpWebhookSender::new()?;
    let fanout = Fanout::new(Arc::new(SystemNotifier::detect()), Arc::new(sender));
    let engine = HookEngine::new(storage, config, fanout);

    match engine.handle(event, Utc::now()).await {
        HandleOutcome::Dispatched(report) => tracing::info!(
            delivered = report.succeeded(),
            total = report.outcomes.len(),
            "Notification dispatched"
        ),
        HandleOutcome::Skipped(reason) => tracing::debug!(reason = %reason, "Event skipped"),
        outcome => tracing::debug!(outcome = ?outcome, "Event handled"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, StorageConfig) {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().join(".claude"));
        (temp, storage)
    }

    #[tokio::test]
    async fn first_stop_writes_defaults_and_dispatches_nothing() {
        let (_temp, storage) = storage();
        let payload = br#"{"hook_event_name": "Stop", "session_id": "s1", "stop_reason": "end_turn"}"#;

        handle_payload(&storage, payload).await.unwrap();

        assert!(config_exists(&storage));
        assert_eq!(load_config(&storage), NotifierConfig::default());
        assert!(!storage.activity_log_file().exists());
        assert!(!storage.sessions_dir().exists());
    }

    #[tokio::test]
    async fn unusable_payloads_touch_nothing() {
        let (_temp, storage) = storage();

        for payload in [
            &b""[..],
            &b"{ not json"[..],
            &br#"{"hook_event_name": "PreToolUse", "session_id": "s1"}"#[..],
        ] {
            handle_payload(&storage, payload).await.unwrap();
        }

        assert!(!storage.root().exists());
    }

    #[tokio::test]
    async fn other_events_never_write_config() {
        let (_temp, storage) = storage();
        let payload = br#"{"hook_event_name": "UserPromptSubmit", "session_id": "s1", "cwd": "/work"}"#;

        handle_payload(&storage, payload).await.unwrap();

        assert!(!config_exists(&storage));
        assert!(storage.sessions_dir().join("s1.json").exists());
    }
}
