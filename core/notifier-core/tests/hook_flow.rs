//! End-to-end hook flows against a temp `~/.claude` with fake channels.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fs_err as fs;
use tempfile::TempDir;

use notifier_core::dispatch::{DesktopContent, SkipReason};
use notifier_core::session::SessionStore;
use notifier_core::webhook::WebhookRequest;
use notifier_core::{
    classify, Fanout, HandleOutcome, HookEngine, NotificationCapability, NotifierConfig,
    NotifierError, Result, StorageConfig, WebhookConfig, WebhookKind, WebhookSender,
};

#[derive(Default)]
struct FakeCapability {
    desktop: Mutex<Vec<DesktopContent>>,
    spoken: Mutex<Vec<String>>,
    activations: AtomicUsize,
}

impl NotificationCapability for FakeCapability {
    fn notify_desktop(&self, content: &DesktopContent) -> Result<()> {
        self.desktop.lock().unwrap().push(content.clone());
        Ok(())
    }

    fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn activate_terminal(&self) -> Result<()> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct FakeSender {
    sent: Mutex<Vec<WebhookRequest>>,
    fail: bool,
}

#[async_trait]
impl WebhookSender for FakeSender {
    async fn send(&self, request: &WebhookRequest) -> Result<()> {
        self.sent.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(NotifierError::WebhookStatus {
                kind: request.kind.to_string(),
                status: 503,
            });
        }
        Ok(())
    }
}

struct Harness {
    _temp: TempDir,
    storage: StorageConfig,
    capability: Arc<FakeCapability>,
    sender: Arc<FakeSender>,
    engine: HookEngine,
}

fn harness_with(config: NotifierConfig, sender: FakeSender) -> Harness {
    let temp = TempDir::new().unwrap();
    let storage = StorageConfig::with_root(temp.path().join(".claude"));
    let capability = Arc::new(FakeCapability::default());
    let sender = Arc::new(sender);
    let fanout = Fanout::new(capability.clone(), sender.clone());
    let engine = HookEngine::new(&storage, config, fanout);
    Harness {
        _temp: temp,
        storage,
        capability,
        sender,
        engine,
    }
}

fn harness() -> Harness {
    harness_with(
        NotifierConfig {
            webhooks: Vec::new(),
            ..NotifierConfig::default()
        },
        FakeSender::default(),
    )
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

async fn send(h: &Harness, payload: &str, now: DateTime<Utc>) -> HandleOutcome {
    let event = classify(payload.as_bytes()).unwrap();
    h.engine.handle(event, now).await
}

fn activity_log(h: &Harness) -> String {
    fs::read_to_string(h.storage.activity_log_file()).unwrap_or_default()
}

#[tokio::test]
async fn long_task_notifies_with_duration() {
    let h = harness();

    let outcome = send(
        &h,
        r#"{"hook_event_name":"UserPromptSubmit","session_id":"abc123","cwd":"/repo"}"#,
        at(0),
    )
    .await;
    assert!(matches!(outcome, HandleOutcome::Recorded));

    let outcome = send(
        &h,
        r#"{"hook_event_name":"Stop","session_id":"abc123","stop_reason":"end_turn"}"#,
        at(15),
    )
    .await;

    let HandleOutcome::Dispatched(report) = outcome else {
        panic!("expected dispatch, got {:?}", outcome);
    };
    assert_eq!(report.succeeded(), 1);

    let desktop = h.capability.desktop.lock().unwrap();
    assert_eq!(desktop.len(), 1);
    assert_eq!(desktop[0].title, "✅ Task Completed");
    assert_eq!(desktop[0].body, "Session: abc123... Took 15s");

    let log = activity_log(&h);
    assert!(log.contains("Stop abc123: Task Completed - end_turn (1/1 channels delivered)"));
}

#[tokio::test]
async fn short_task_is_skipped_and_logged() {
    let h = harness();

    send(
        &h,
        r#"{"hook_event_name":"UserPromptSubmit","session_id":"abc123"}"#,
        at(0),
    )
    .await;
    let outcome = send(
        &h,
        r#"{"hook_event_name":"Stop","session_id":"abc123"}"#,
        at(5),
    )
    .await;

    assert!(matches!(
        outcome,
        HandleOutcome::Skipped(SkipReason::BelowMinDuration {
            duration_secs: 5,
            min_duration: 10
        })
    ));
    assert!(h.capability.desktop.lock().unwrap().is_empty());
    assert!(activity_log(&h).contains("skipped"));
}

#[tokio::test]
async fn stop_without_submit_still_notifies() {
    let h = harness();

    let outcome = send(
        &h,
        r#"{"hook_event_name":"Stop","session_id":"fresh","stop_reason":"tool_error: timeout"}"#,
        at(0),
    )
    .await;

    assert!(matches!(outcome, HandleOutcome::Dispatched(_)));
    let desktop = h.capability.desktop.lock().unwrap();
    assert_eq!(desktop[0].title, "⚠️ Task Completed (with errors)");
    assert!(desktop[0].is_error);
    assert_eq!(h.engine.tracker().store().get("fresh"), None);
}

#[tokio::test]
async fn repeated_idle_prompts_are_suppressed_after_window() {
    let h = harness();
    let idle = r#"{"hook_event_name":"Notification","session_id":"s1","notification_type":"idle_prompt","message":"Claude is waiting for your input"}"#;
    let permission = r#"{"hook_event_name":"Notification","session_id":"s1","notification_type":"permission_prompt"}"#;

    assert!(matches!(send(&h, idle, at(0)).await, HandleOutcome::Dispatched(_)));
    assert!(matches!(send(&h, idle, at(4 * 60)).await, HandleOutcome::Dispatched(_)));
    assert!(matches!(
        send(&h, idle, at(6 * 60)).await,
        HandleOutcome::Skipped(SkipReason::IdleSuppressed)
    ));
    assert!(matches!(send(&h, permission, at(6 * 60)).await, HandleOutcome::Dispatched(_)));

    let desktop = h.capability.desktop.lock().unwrap();
    assert_eq!(desktop.len(), 3);
    assert_eq!(desktop[0].title, "Claude Code Waiting for Input");
    assert_eq!(desktop[2].title, "Claude Code Permission Request");
    assert_eq!(desktop[2].body, "Action required");
}

#[tokio::test]
async fn disabled_notification_type_touches_nothing() {
    let h = harness();

    let outcome = send(
        &h,
        r#"{"hook_event_name":"Notification","session_id":"s1","notification_type":"auth_success"}"#,
        at(0),
    )
    .await;

    assert!(matches!(
        outcome,
        HandleOutcome::Skipped(SkipReason::NotificationTypeDisabled(_))
    ));
    assert!(!h.storage.sessions_dir().exists());
    assert!(h.capability.desktop.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_session_is_not_recorded() {
    let h = harness();

    let outcome = send(&h, r#"{"hook_event_name":"UserPromptSubmit"}"#, at(0)).await;

    assert!(matches!(outcome, HandleOutcome::Ignored));
    assert!(!h.storage.sessions_dir().exists());
}

#[tokio::test]
async fn session_end_sweeps_old_records_but_keeps_current() {
    let h = harness();
    let now = at(30 * 86_400);
    let store = h.engine.tracker().store();

    for id in ["old-session", "current"] {
        send(
            &h,
            &format!(r#"{{"hook_event_name":"UserPromptSubmit","session_id":"{}"}}"#, id),
            at(0),
        )
        .await;
        let path = store.record_path(id).unwrap();
        let mtime: SystemTime = (now - Duration::days(10)).into();
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    let outcome = send(
        &h,
        r#"{"hook_event_name":"SessionEnd","session_id":"current","reason":"exit"}"#,
        now,
    )
    .await;

    let HandleOutcome::Swept(stats) = outcome else {
        panic!("expected sweep, got {:?}", outcome);
    };
    assert_eq!(stats.deleted_count, 1);
    assert_eq!(stats.skipped_count, 1);
    assert_eq!(store.get("old-session"), None);
    assert!(store.get("current").is_some());
}

#[tokio::test]
async fn session_end_respects_cleanup_toggle() {
    let h = harness_with(
        NotifierConfig {
            enable_session_cleanup: false,
            ..NotifierConfig::default()
        },
        FakeSender::default(),
    );

    let outcome = send(
        &h,
        r#"{"hook_event_name":"SessionEnd","session_id":"current"}"#,
        at(0),
    )
    .await;

    assert!(matches!(
        outcome,
        HandleOutcome::Skipped(SkipReason::CleanupDisabled)
    ));
}

#[tokio::test]
async fn failing_webhook_does_not_stop_other_channels() {
    let webhook = WebhookConfig {
        enabled: true,
        url: "https://example.com/hook".to_string(),
        kind: WebhookKind::Custom,
        token: None,
        chat_id: None,
        secret: None,
    };
    let h = harness_with(
        NotifierConfig {
            enable_voice: true,
            auto_activate_window: true,
            webhooks: vec![webhook],
            ..NotifierConfig::default()
        },
        FakeSender {
            fail: true,
            ..FakeSender::default()
        },
    );

    let outcome = send(
        &h,
        r#"{"hook_event_name":"Stop","session_id":"0123456789abcdef0123","project_path":"/repo"}"#,
        at(0),
    )
    .await;

    let HandleOutcome::Dispatched(report) = outcome else {
        panic!("expected dispatch, got {:?}", outcome);
    };
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(h.capability.desktop.lock().unwrap().len(), 1);
    assert_eq!(h.capability.spoken.lock().unwrap()[0], "Task completed");
    assert_eq!(h.capability.activations.load(Ordering::SeqCst), 1);

    let sent = h.sender.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body["sessionId"], "0123456789abcdef");
    assert_eq!(sent[0].body["projectPath"], "/repo");

    assert!(activity_log(&h).contains("webhook:custom failed"));
}

#[tokio::test]
async fn logging_disabled_writes_no_activity_log() {
    let h = harness_with(
        NotifierConfig {
            enable_logging: false,
            webhooks: Vec::new(),
            ..NotifierConfig::default()
        },
        FakeSender::default(),
    );

    send(&h, r#"{"hook_event_name":"Stop","session_id":"abc"}"#, at(0)).await;

    assert!(!h.storage.activity_log_file().exists());
}
