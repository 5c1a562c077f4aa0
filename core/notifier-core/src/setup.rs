//! Hook registration in Claude Code's `settings.json`.
//!
//! Claude Code runs `notifier-hook handle` on four lifecycle events. This
//! module shows, checks and installs those entries.
//!
//! ## Design
//!
//! The installer only ever adds entries: other settings, other hooks, and
//! existing notifier entries are left as they are. A settings file that does
//! not parse is an error and is never overwritten. Writes are atomic
//! (temp + rename) and the previous file is copied to `settings.json.backup`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use fs_err as fs;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::write_atomic;
use crate::error::{NotifierError, Result};
use crate::storage::StorageConfig;

/// Events the notifier must receive.
pub const HOOK_EVENTS: [&str; 4] = ["Stop", "UserPromptSubmit", "SessionEnd", "Notification"];

const FALLBACK_HOOK_COMMAND: &str = "notifier-hook handle";

/// Matches the current binary as well as older script-based installs.
static NOTIFIER_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"notifier-hook(\.exe)?(["'\s]|$)|notifier[/\\]dist[/\\]hook\.js"#).unwrap()
});

fn is_notifier_command(command: Option<&str>) -> bool {
    command.is_some_and(|c| NOTIFIER_COMMAND.is_match(c))
}

/// The command to register: this executable's absolute path when known.
pub fn default_hook_command() -> String {
    match std::env::current_exe() {
        Ok(path) => format!("{} handle", path.display()),
        Err(err) => {
            tracing::debug!(error = %err, "Could not resolve current executable");
            FALLBACK_HOOK_COMMAND.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookState {
    Configured,
    Missing,
    /// Entries exist for the event but none runs the notifier.
    Misconfigured { commands: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCheck {
    pub event: String,
    pub state: HookState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub skipped: Vec<String>,
    pub backup: Option<PathBuf>,
}

pub struct HookInstaller {
    storage: StorageConfig,
    command: String,
}

impl HookInstaller {
    pub fn new(storage: StorageConfig, command: impl Into<String>) -> Self {
        Self {
            storage,
            command: command.into(),
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.storage.claude_settings_file()
    }

    /// The current `hooks` block, or None if the file or block is absent.
    pub fn current_hooks(&self) -> Result<Option<Value>> {
        let settings = self.read_settings()?;
        Ok(settings.and_then(|s| s.hooks).map(|hooks| json!(hooks)))
    }

    /// Recommended `{"hooks": {...}}` block for the given events.
    pub fn recommended_hooks(&self, events: &[&str]) -> Value {
        let hooks: BTreeMap<String, Vec<HookConfig>> = events
            .iter()
            .map(|event| (event.to_string(), vec![self.hook_config()]))
            .collect();
        json!({ "hooks": hooks })
    }

    /// Returns the reason hooks will not run, if Claude settings disable them.
    pub fn check_policy_blocks(&self) -> Option<String> {
        let local = self.storage.root().join("settings.local.json");
        for path in [self.settings_path(), local] {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            let Ok(settings) = serde_json::from_str::<Value>(&content) else {
                continue;
            };
            if settings.get("disableAllHooks") == Some(&Value::Bool(true)) {
                return Some("Hooks disabled by disableAllHooks setting".to_string());
            }
            if settings.get("allowManagedHooksOnly") == Some(&Value::Bool(true)) {
                return Some(
                    "Only managed hooks allowed by allowManagedHooksOnly setting".to_string(),
                );
            }
        }
        None
    }

    pub fn check(&self) -> Result<Vec<HookCheck>> {
        let hooks = self
            .read_settings()?
            .and_then(|s| s.hooks)
            .unwrap_or_default();

        Ok(HOOK_EVENTS
            .iter()
            .map(|event| {
                let state = match hooks.get(*event) {
                    None => HookState::Missing,
                    Some(configs) if configs.is_empty() => HookState::Missing,
                    Some(configs) if has_notifier_hook(configs) => HookState::Configured,
                    Some(configs) => HookState::Misconfigured {
                        commands: configs
                            .iter()
                            .flat_map(|c| c.hooks.iter().flatten())
                            .filter_map(|h| h.command.clone())
                            .collect(),
                    },
                };
                HookCheck {
                    event: event.to_string(),
                    state,
                }
            })
            .collect())
    }

    pub fn install(&self) -> Result<InstallReport> {
        let settings_path = self.settings_path();
        let mut settings = self.read_settings()?.unwrap_or_default();
        let mut report = InstallReport::default();

        if settings_path.exists() {
            let backup = backup_path(&settings_path);
            fs::copy(&settings_path, &backup).map_err(|e| {
                NotifierError::io(format!("Failed to back up {}", settings_path.display()), e)
            })?;
            report.backup = Some(backup);
        }

        let hooks = settings.hooks.get_or_insert_with(BTreeMap::new);
        for event in HOOK_EVENTS {
            let configs = hooks.entry(event.to_string()).or_default();
            if has_notifier_hook(configs) {
                report.skipped.push(event.to_string());
                continue;
            }
            configs.push(self.hook_config());
            report.installed.push(event.to_string());
        }

        let content = serde_json::to_string_pretty(&settings)
            .map_err(|e| NotifierError::json("Failed to serialize settings", e))?;
        write_atomic(&settings_path, content.as_bytes()).map_err(|e| {
            NotifierError::io(format!("Failed to write {}", settings_path.display()), e)
        })?;

        tracing::info!(
            installed = report.installed.len(),
            skipped = report.skipped.len(),
            "Registered notifier hooks"
        );
        Ok(report)
    }

    fn hook_config(&self) -> HookConfig {
        HookConfig {
            matcher: None,
            hooks: Some(vec![InnerHook {
                hook_type: Some("command".to_string()),
                command: Some(self.command.clone()),
                other: BTreeMap::new(),
            }]),
            other: BTreeMap::new(),
        }
    }

    fn read_settings(&self) -> Result<Option<SettingsFile>> {
        let path = self.settings_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(NotifierError::io(
                    format!("Failed to read {}", path.display()),
                    err,
                ))
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| NotifierError::SettingsMalformed {
                path,
                details: format!(
                    "{}. Fix the JSON syntax or delete the file to start fresh.",
                    e
                ),
            })
    }
}

fn backup_path(settings_path: &std::path::Path) -> PathBuf {
    let mut name = settings_path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

fn has_notifier_hook(configs: &[HookConfig]) -> bool {
    configs
        .iter()
        .flat_map(|c| c.hooks.iter().flatten())
        .any(|h| is_notifier_command(h.command.as_deref()))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    hooks: Option<BTreeMap<String, Vec<HookConfig>>>,
    #[serde(flatten)]
    other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HookConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    matcher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hooks: Option<Vec<InnerHook>>,
    #[serde(flatten)]
    other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InnerHook {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    hook_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(flatten)]
    other: BTreeMap<String, Value>,
}
