//! Maintenance subcommands. These talk to a person, so they print to stdout.

use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::ValueEnum;
use notifier_core::dispatch::{decide, Decision, DecisionInput, DispatchReport};
use notifier_core::session::{FileSessionStore, SessionTracker};
use notifier_core::setup::{default_hook_command, HookInstaller, HookState, HOOK_EVENTS};
use notifier_core::{
    config_exists, load_config, save_config, ActivityLog, Fanout, HttpWebhookSender,
    NotifierConfig, StorageConfig, SystemNotifier,
};

/// Records untouched for this long count as inactive for `clean session`.
const INACTIVE_AFTER_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CleanTarget {
    Log,
    Session,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestKind {
    Stop,
    Notification,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HooksAction {
    Show,
    Print,
    Install,
    Check,
}

pub fn init(storage: &StorageConfig, force: bool) -> Result<(), String> {
    let path = storage.config_file();
    if config_exists(storage) && !force {
        println!("Configuration already exists: {}", path.display());
        println!("Use --force to overwrite it with the defaults.");
        return Ok(());
    }

    save_config(storage, &NotifierConfig::default())?;
    println!("✓ Wrote default configuration: {}", path.display());
    Ok(())
}

pub fn show_config(storage: &StorageConfig) -> Result<(), String> {
    let path = storage.config_file();
    println!("Config file: {}", path.display());
    if !config_exists(storage) {
        println!("(not found, showing defaults)");
    }

    let config = load_config(storage);
    let json = serde_json::to_string_pretty(&config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    println!("\n{}", json);
    Ok(())
}

pub fn clean(storage: &StorageConfig, target: CleanTarget) -> Result<(), String> {
    if matches!(target, CleanTarget::Log | CleanTarget::All) {
        let log = ActivityLog::new(storage.activity_log_file(), true);
        let removed = log
            .clear()
            .map_err(|e| format!("Failed to delete activity log: {}", e))?;
        if removed {
            println!("✓ Deleted activity log");
        } else {
            println!("Activity log does not exist");
        }
    }

    if matches!(target, CleanTarget::Session | CleanTarget::All) {
        let tracker = SessionTracker::new(FileSessionStore::new(&storage.sessions_dir()));
        let stats =
            tracker.clean_inactive(Duration::minutes(INACTIVE_AFTER_MINUTES), Utc::now());
        println!(
            "✓ Removed {} session records, kept {} active",
            stats.deleted_count, stats.skipped_count
        );
        for err in &stats.errors {
            println!("  ✗ {}", err);
        }
    }

    Ok(())
}

pub async fn test(storage: &StorageConfig, kind: TestKind) -> Result<(), String> {
    let config = load_config(storage);
    let fanout = Fanout::new(
        Arc::new(SystemNotifier::detect()),
        Arc::new(HttpWebhookSender::new()?),
    );
    let session_id = format!("test-{}", Utc::now().timestamp_millis());

    if matches!(kind, TestKind::Stop | TestKind::All) {
        println!("Testing task-complete notification...");
        let input = DecisionInput::TaskStopped {
            session_id: &session_id,
            stop_reason: "end_turn",
            duration_secs: None,
            project_path: None,
        };
        run_test(&fanout, &config, &input).await;
    }

    if matches!(kind, TestKind::Notification | TestKind::All) {
        println!("Testing permission-prompt notification...");
        if !config.enable_notification_hook {
            println!("  Notification hook is disabled (enableNotificationHook = false)");
        } else {
            let input = DecisionInput::Prompt {
                session_id: &session_id,
                notification_type: "permission_prompt",
                message: Some("Claude needs your permission to use Bash"),
                project_path: None,
                idle_suppressed: false,
            };
            run_test(&fanout, &config, &input).await;
        }
    }

    Ok(())
}

async fn run_test(fanout: &Fanout, config: &NotifierConfig, input: &DecisionInput<'_>) {
    match decide(input, config) {
        Decision::Skip(reason) => println!("  Skipped: {}", reason),
        Decision::Dispatch(decision) => {
            if decision.targets.is_empty() {
                println!("  No channels enabled");
                return;
            }
            let report = fanout.dispatch(&decision, Utc::now()).await;
            print_report(&report);
        }
    }
}

fn print_report(report: &DispatchReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => println!("  ✓ {}", outcome.channel),
            Err(err) => println!("  ✗ {}: {}", outcome.channel, err),
        }
    }
}

pub fn hooks(storage: &StorageConfig, action: HooksAction) -> Result<(), String> {
    let installer = HookInstaller::new(storage.clone(), default_hook_command());

    match action {
        HooksAction::Show => match installer.current_hooks()? {
            Some(hooks) => {
                println!("Current Claude Code hooks ({}):\n", installer.settings_path().display());
                print_json(&serde_json::json!({ "hooks": hooks }))?;
            }
            None => println!("No hooks configured"),
        },

        HooksAction::Print => {
            println!("Add this to {}:\n", installer.settings_path().display());
            print_json(&installer.recommended_hooks(&HOOK_EVENTS))?;
        }

        HooksAction::Install => {
            if let Some(reason) = installer.check_policy_blocks() {
                println!("⚠ {}", reason);
            }
            let report = installer.install()?;
            if let Some(backup) = &report.backup {
                println!("✓ Backed up settings to {}", backup.display());
            }
            if !report.installed.is_empty() {
                println!("✓ Installed hooks: {}", report.installed.join(", "));
            }
            if !report.skipped.is_empty() {
                println!("  Already configured: {}", report.skipped.join(", "));
            }
            println!("✓ Saved {}", installer.settings_path().display());
            println!("\nRestart Claude Code for the hooks to take effect.");
        }

        HooksAction::Check => {
            if let Some(reason) = installer.check_policy_blocks() {
                println!("⚠ {}", reason);
            }
            let checks = installer.check()?;
            let mut missing = Vec::new();
            for check in &checks {
                match &check.state {
                    HookState::Configured => println!("  ✓ {}: configured", check.event),
                    HookState::Missing => {
                        println!("  ✗ {}: not configured", check.event);
                        missing.push(check.event.as_str());
                    }
                    HookState::Misconfigured { commands } => {
                        println!("  ⚠ {}: configured with other commands", check.event);
                        println!("    current: {}", commands.join(", "));
                    }
                }
            }

            if checks.iter().all(|c| c.state == HookState::Configured) {
                println!("\n✓ All hooks configured");
            } else if !missing.is_empty() {
                println!("\nMissing hooks. Add this to {}:\n", installer.settings_path().display());
                print_json(&installer.recommended_hooks(&missing))?;
            }
        }
    }

    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to format JSON: {}", e))?;
    println!("{}", json);
    Ok(())
}
