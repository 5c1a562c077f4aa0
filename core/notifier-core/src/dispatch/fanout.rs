//! Concurrent delivery to every selected channel.
//!
//! All channels start together and are awaited together. Each one gets its own
//! deadline, and a failure or timeout in one never cancels or delays another.
//! Local channels call blocking OS commands, so they run on the blocking pool.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;

use super::decision::{ChannelTarget, DispatchDecision};
use crate::error::{NotifierError, Result};
use crate::notify::NotificationCapability;
use crate::webhook::{build_request, WebhookSender};

/// Upper bound on any single channel.
pub const CHANNEL_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug)]
pub struct ChannelOutcome {
    pub channel: String,
    pub result: Result<()>,
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ChannelOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

pub struct Fanout {
    capability: Arc<dyn NotificationCapability>,
    sender: Arc<dyn WebhookSender>,
    timeout: Duration,
}

impl Fanout {
    pub fn new(capability: Arc<dyn NotificationCapability>, sender: Arc<dyn WebhookSender>) -> Self {
        Self {
            capability,
            sender,
            timeout: CHANNEL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delivers to every target and reports each outcome. Webhooks of unknown
    /// kind are skipped with a warning and do not appear in the report.
    pub async fn dispatch(&self, decision: &DispatchDecision, now: DateTime<Utc>) -> DispatchReport {
        let targets = decision.targets.iter().filter(|target| match target {
            ChannelTarget::Webhook(webhook) if !webhook.kind.is_known() => {
                tracing::warn!(kind = %webhook.kind, "Unknown webhook type, skipping");
                false
            }
            _ => true,
        });

        let deliveries = targets.map(|target| self.run_channel(target, decision, now));
        let outcomes = join_all(deliveries).await;

        for outcome in &outcomes {
            match &outcome.result {
                Ok(()) => tracing::debug!(channel = %outcome.channel, "Channel delivered"),
                Err(err) => {
                    tracing::warn!(channel = %outcome.channel, error = %err, "Channel failed")
                }
            }
        }

        DispatchReport { outcomes }
    }

    async fn run_channel(
        &self,
        target: &ChannelTarget,
        decision: &DispatchDecision,
        now: DateTime<Utc>,
    ) -> ChannelOutcome {
        let channel = target.label();
        let result = match tokio::time::timeout(self.timeout, self.deliver(target, decision, now)).await {
            Ok(result) => result,
            Err(_) => Err(NotifierError::ChannelTimeout {
                channel: channel.clone(),
                secs: self.timeout.as_secs(),
            }),
        };
        ChannelOutcome { channel, result }
    }

    async fn deliver(
        &self,
        target: &ChannelTarget,
        decision: &DispatchDecision,
        now: DateTime<Utc>,
    ) -> Result<()> {
        match target {
            ChannelTarget::Desktop => {
                let content = decision.desktop.clone();
                self.blocking(target, move |cap| cap.notify_desktop(&content))
                    .await
            }
            ChannelTarget::Voice => {
                let speech = decision.speech.clone();
                self.blocking(target, move |cap| cap.speak(&speech)).await
            }
            ChannelTarget::Terminal => self.blocking(target, |cap| cap.activate_terminal()).await,
            ChannelTarget::Webhook(webhook) => {
                let request = build_request(webhook, &decision.payload, now)?;
                self.sender.send(&request).await
            }
        }
    }

    async fn blocking<F>(&self, target: &ChannelTarget, call: F) -> Result<()>
    where
        F: FnOnce(&dyn NotificationCapability) -> Result<()> + Send + 'static,
    {
        let capability = Arc::clone(&self.capability);
        tokio::task::spawn_blocking(move || call(capability.as_ref()))
            .await
            .map_err(|e| NotifierError::ChannelAborted {
                channel: target.label(),
                details: e.to_string(),
            })?
    }
}
