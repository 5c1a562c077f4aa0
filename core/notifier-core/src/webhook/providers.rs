//! Per-provider request formatting.
//!
//! Every builder is pure: the same payload, descriptor and clock always produce
//! the same request. Delivery lives in [`super::HttpWebhookSender`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use super::signing::signed_url;
use crate::config::{WebhookConfig, WebhookKind};
use crate::dispatch::NotificationPayload;
use crate::error::{NotifierError, Result};

const FOOTER: &str = "Claude Code Notifier";
const SLACK_GOOD: &str = "good";
const SLACK_DANGER: &str = "danger";
const DISCORD_GREEN: u32 = 0x57F287;
const DISCORD_RED: u32 = 0xED4245;

/// A fully formatted POST, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookRequest {
    pub kind: WebhookKind,
    pub url: String,
    pub body: Value,
}

pub fn build_request(
    webhook: &WebhookConfig,
    payload: &NotificationPayload,
    now: DateTime<Utc>,
) -> Result<WebhookRequest> {
    let kind = webhook.kind.clone();
    let (url, body) = match &kind {
        WebhookKind::Slack => (require_url(webhook)?, slack(payload, now)),
        WebhookKind::Discord => (require_url(webhook)?, discord(payload, now)),
        WebhookKind::Telegram => telegram(webhook, payload)?,
        WebhookKind::DingTalk => (
            maybe_signed(webhook, now.timestamp_millis())?,
            dingtalk(payload),
        ),
        WebhookKind::Feishu => (maybe_signed(webhook, now.timestamp())?, feishu(payload)),
        WebhookKind::WeCom => (require_url(webhook)?, wecom(payload)),
        WebhookKind::Custom => (require_url(webhook)?, custom(payload, now)),
        WebhookKind::Other(name) => {
            return Err(NotifierError::WebhookMisconfigured {
                kind: name.clone(),
                reason: "unknown webhook type".to_string(),
            })
        }
    };
    Ok(WebhookRequest { kind, url, body })
}

fn require_url(webhook: &WebhookConfig) -> Result<String> {
    if webhook.url.trim().is_empty() {
        return Err(NotifierError::WebhookMisconfigured {
            kind: webhook.kind.to_string(),
            reason: "url is empty".to_string(),
        });
    }
    Ok(webhook.url.clone())
}

fn maybe_signed(webhook: &WebhookConfig, timestamp: i64) -> Result<String> {
    let url = require_url(webhook)?;
    match webhook.secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => signed_url(&webhook.kind, &url, secret, timestamp),
        None => Ok(url),
    }
}

fn emoji(payload: &NotificationPayload) -> &'static str {
    if payload.is_error {
        "⚠️"
    } else {
        "✅"
    }
}

fn headline(payload: &NotificationPayload) -> String {
    format!("Claude Code {}", payload.title)
}

fn duration_text(payload: &NotificationPayload) -> Option<String> {
    payload.duration_secs.map(|d| format!("{}s", d))
}

fn rfc3339(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn slack(payload: &NotificationPayload, now: DateTime<Utc>) -> Value {
    let mut fields = vec![
        json!({ "title": "Session ID", "value": payload.session_id_prefix, "short": true }),
        json!({ "title": "Status", "value": payload.status, "short": true }),
    ];
    if let Some(duration) = duration_text(payload) {
        fields.push(json!({ "title": "Duration", "value": duration, "short": true }));
    }
    if let Some(project) = &payload.project_path {
        fields.push(json!({ "title": "Project", "value": project, "short": false }));
    }

    let color = if payload.is_error { SLACK_DANGER } else { SLACK_GOOD };
    json!({
        "text": format!("{} {}", emoji(payload), headline(payload)),
        "attachments": [{
            "color": color,
            "fields": fields,
            "footer": FOOTER,
            "ts": now.timestamp(),
        }],
    })
}

fn discord(payload: &NotificationPayload, now: DateTime<Utc>) -> Value {
    let mut fields = vec![
        json!({ "name": "Session ID", "value": format!("`{}`", payload.session_id_prefix), "inline": true }),
        json!({ "name": "Status", "value": payload.status, "inline": true }),
    ];
    if let Some(duration) = duration_text(payload) {
        fields.push(json!({ "name": "Duration", "value": duration, "inline": true }));
    }
    if let Some(project) = &payload.project_path {
        fields.push(json!({ "name": "Project", "value": format!("`{}`", project), "inline": false }));
    }

    let color = if payload.is_error { DISCORD_RED } else { DISCORD_GREEN };
    json!({
        "content": format!("{} **{}**", emoji(payload), headline(payload)),
        "embeds": [{
            "color": color,
            "fields": fields,
            "timestamp": rfc3339(now),
            "footer": { "text": FOOTER },
        }],
    })
}

fn telegram(webhook: &WebhookConfig, payload: &NotificationPayload) -> Result<(String, Value)> {
    let missing = |field: &str| NotifierError::WebhookMisconfigured {
        kind: webhook.kind.to_string(),
        reason: format!("{} is required", field),
    };
    let token = webhook
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| missing("token"))?;
    let chat_id = webhook
        .chat_id
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| missing("chatId"))?;

    let mut text = format!("{} *{}*\n\n", emoji(payload), headline(payload));
    text.push_str(&format!("*Session ID:* `{}`\n", payload.session_id_prefix));
    text.push_str(&format!("*Status:* {}\n", payload.status));
    if let Some(duration) = duration_text(payload) {
        text.push_str(&format!("*Duration:* {}\n", duration));
    }
    if let Some(project) = &payload.project_path {
        text.push_str(&format!("*Project:* `{}`\n", project));
    }

    Ok((
        format!("https://api.telegram.org/bot{}/sendMessage", token),
        json!({ "chat_id": chat_id, "text": text, "parse_mode": "Markdown" }),
    ))
}

fn dingtalk(payload: &NotificationPayload) -> Value {
    let mut text = format!("{} **{}**\n\n", emoji(payload), headline(payload));
    text.push_str(&format!("> **Session ID:** {}\n>\n", payload.session_id_prefix));
    text.push_str(&format!("> **Status:** {}\n>\n", payload.status));
    text.push_str(&format!(
        "> **Duration:** {}\n>\n",
        duration_text(payload).unwrap_or_else(|| "unknown".to_string())
    ));
    if let Some(project) = &payload.project_path {
        text.push_str(&format!("> **Project:** {}\n", project));
    }

    json!({
        "msgtype": "markdown",
        "markdown": { "title": headline(payload), "text": text },
    })
}

fn feishu(payload: &NotificationPayload) -> Value {
    let mut text = format!("{} **{}**\n", emoji(payload), headline(payload));
    text.push_str(&format!("Session ID: {}\n", payload.session_id_prefix));
    text.push_str(&format!("Status: {}\n", payload.status));
    if let Some(duration) = duration_text(payload) {
        text.push_str(&format!("Duration: {}\n", duration));
    }
    if let Some(project) = &payload.project_path {
        text.push_str(&format!("Project: {}\n", project));
    }

    json!({ "msg_type": "text", "content": { "text": text } })
}

fn wecom(payload: &NotificationPayload) -> Value {
    let mut content = format!("{} **{}**\n", emoji(payload), headline(payload));
    content.push_str(&format!(
        "> Session ID: <font color=\"comment\">{}</font>\n",
        payload.session_id_prefix
    ));
    content.push_str(&format!("> Status: {}\n", payload.status));
    if let Some(duration) = duration_text(payload) {
        content.push_str(&format!("> Duration: <font color=\"info\">{}</font>\n", duration));
    }
    if let Some(project) = &payload.project_path {
        content.push_str(&format!("> Project: {}\n", project));
    }

    json!({ "msgtype": "markdown", "markdown": { "content": content } })
}

fn custom(payload: &NotificationPayload, now: DateTime<Utc>) -> Value {
    json!({
        "title": headline(payload),
        "sessionId": payload.session_id_prefix,
        "stopReason": payload.status,
        "duration": payload.duration_secs,
        "projectPath": payload.project_path,
        "timestamp": rfc3339(now),
    })
}
