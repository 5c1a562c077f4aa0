//! Configuration loading and saving.
//!
//! The configuration file is user-edited JSON (`~/.claude/webhook-config.json`).
//! Every field has a default, so a partial file is merged over the defaults one
//! field at a time. Loading never fails: a missing or corrupt file yields the
//! defaults, and a single bad value only costs that value. Both are warned
//! about in the diagnostic log.

use std::fmt;
use std::io::Write;
use std::path::Path;

use fs_err as fs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{NotifierError, Result};
use crate::storage::StorageConfig;

pub const IDLE_PROMPT: &str = "idle_prompt";
pub const PERMISSION_PROMPT: &str = "permission_prompt";

/// Webhook provider named by a channel descriptor's `type` field.
///
/// Unknown names deserialize to [`WebhookKind::Other`] and serialize back
/// unchanged, so a config written by a newer version survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WebhookKind {
    Slack,
    Discord,
    Telegram,
    DingTalk,
    Feishu,
    WeCom,
    Custom,
    Other(String),
}

impl WebhookKind {
    pub fn as_str(&self) -> &str {
        match self {
            WebhookKind::Slack => "slack",
            WebhookKind::Discord => "discord",
            WebhookKind::Telegram => "telegram",
            WebhookKind::DingTalk => "dingtalk",
            WebhookKind::Feishu => "feishu",
            WebhookKind::WeCom => "wecom",
            WebhookKind::Custom => "custom",
            WebhookKind::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, WebhookKind::Other(_))
    }
}

impl From<String> for WebhookKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "slack" => WebhookKind::Slack,
            "discord" => WebhookKind::Discord,
            "telegram" => WebhookKind::Telegram,
            "dingtalk" => WebhookKind::DingTalk,
            "feishu" => WebhookKind::Feishu,
            "wecom" => WebhookKind::WeCom,
            "custom" => WebhookKind::Custom,
            _ => WebhookKind::Other(value),
        }
    }
}

impl From<WebhookKind> for String {
    fn from(kind: WebhookKind) -> String {
        kind.as_str().to_string()
    }
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound webhook destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type")]
    pub kind: WebhookKind,
    /// Telegram bot token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Telegram chat id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    /// DingTalk / Feishu signing secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl WebhookConfig {
    fn sample(kind: WebhookKind, url: &str) -> Self {
        Self {
            enabled: false,
            url: url.to_string(),
            kind,
            token: None,
            chat_id: None,
            secret: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotifierConfig {
    /// Stop events for tasks shorter than this (seconds) are not announced.
    pub min_duration: u64,
    pub enable_system_notification: bool,
    pub enable_voice: bool,
    pub enable_logging: bool,
    pub auto_activate_window: bool,
    pub enable_session_cleanup: bool,
    pub session_cleanup_days: u64,
    pub enable_notification_hook: bool,
    pub notification_hook_types: Vec<String>,
    pub webhooks: Vec<WebhookConfig>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        let mut telegram = WebhookConfig::sample(
            WebhookKind::Telegram,
            "https://api.telegram.org/botYOUR_BOT_TOKEN/sendMessage",
        );
        telegram.token = Some("YOUR_BOT_TOKEN".to_string());
        telegram.chat_id = Some("YOUR_CHAT_ID".to_string());

        Self {
            min_duration: 10,
            enable_system_notification: true,
            enable_voice: false,
            enable_logging: true,
            auto_activate_window: false,
            enable_session_cleanup: true,
            session_cleanup_days: 7,
            enable_notification_hook: true,
            notification_hook_types: vec![PERMISSION_PROMPT.to_string(), IDLE_PROMPT.to_string()],
            webhooks: vec![
                WebhookConfig::sample(
                    WebhookKind::Slack,
                    "https://hooks.slack.com/services/YOUR/WEBHOOK/URL",
                ),
                WebhookConfig::sample(
                    WebhookKind::Discord,
                    "https://discord.com/api/webhooks/YOUR/WEBHOOK",
                ),
                telegram,
            ],
        }
    }
}

impl NotifierConfig {
    pub fn enabled_webhooks(&self) -> impl Iterator<Item = &WebhookConfig> {
        self.webhooks.iter().filter(|w| w.enabled)
    }

    pub fn notification_type_enabled(&self, notification_type: &str) -> bool {
        self.notification_hook_types
            .iter()
            .any(|t| t == notification_type)
    }
}

pub fn config_exists(storage: &StorageConfig) -> bool {
    storage.config_file().exists()
}

/// Loads the configuration, returning defaults if the file is missing or unreadable.
pub fn load_config(storage: &StorageConfig) -> NotifierConfig {
    let path = storage.config_file();
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return NotifierConfig::default()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read config, using defaults");
            return NotifierConfig::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => merge_over_defaults(value, &path),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Failed to parse config, using defaults"
            );
            NotifierConfig::default()
        }
    }
}

/// Applies each top-level field of `value` over the defaults. A field with the
/// wrong shape keeps its default; a bad webhook entry drops only that entry.
fn merge_over_defaults(value: Value, path: &Path) -> NotifierConfig {
    let mut config = NotifierConfig::default();
    let Value::Object(fields) = value else {
        tracing::warn!(path = %path.display(), "Config is not a JSON object, using defaults");
        return config;
    };

    for (key, value) in fields {
        let applied = match key.as_str() {
            "minDuration" => field(value).map(|v| config.min_duration = v),
            "enableSystemNotification" => {
                field(value).map(|v| config.enable_system_notification = v)
            }
            "enableVoice" => field(value).map(|v| config.enable_voice = v),
            "enableLogging" => field(value).map(|v| config.enable_logging = v),
            "autoActivateWindow" => field(value).map(|v| config.auto_activate_window = v),
            "enableSessionCleanup" => field(value).map(|v| config.enable_session_cleanup = v),
            "sessionCleanupDays" => field(value).map(|v| config.session_cleanup_days = v),
            "enableNotificationHook" => {
                field(value).map(|v| config.enable_notification_hook = v)
            }
            "notificationHookTypes" => field(value).map(|v| config.notification_hook_types = v),
            "webhooks" => webhooks(value).map(|v| config.webhooks = v),
            _ => Ok(()),
        };

        if let Err(err) = applied {
            tracing::warn!(
                path = %path.display(),
                field = %key,
                error = %err,
                "Invalid config value, keeping default"
            );
        }
    }

    config
}

fn field<T: DeserializeOwned>(value: Value) -> serde_json::Result<T> {
    serde_json::from_value(value)
}

fn webhooks(value: Value) -> serde_json::Result<Vec<WebhookConfig>> {
    let entries: Vec<Value> = serde_json::from_value(value)?;
    let mut webhooks = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value(entry) {
            Ok(webhook) => webhooks.push(webhook),
            Err(err) => tracing::warn!(index, error = %err, "Skipping invalid webhook entry"),
        }
    }
    Ok(webhooks)
}

/// Saves the configuration atomically (temp file + rename).
pub fn save_config(storage: &StorageConfig, config: &NotifierConfig) -> Result<()> {
    let path = storage.config_file();
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| NotifierError::json("Failed to serialize config", e))?;
    write_atomic(&path, content.as_bytes()).map_err(|source| NotifierError::ConfigWriteFailed {
        path: path.clone(),
        source,
    })
}

pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
    })?;
    fs::create_dir_all(parent)?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(content)?;
    temp_file.flush()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
