//! Outbound webhooks.
//!
//! [`providers`] turns a [`NotificationPayload`](crate::dispatch::NotificationPayload)
//! into a provider-specific request; [`WebhookSender`] delivers it.

mod providers;
mod signing;

pub use providers::{build_request, WebhookRequest};
pub use signing::{signature, signed_url};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{NotifierError, Result};

/// Per-request HTTP timeout. The fan-out's per-channel deadline is longer.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// POSTs the request body as JSON. Any non-2xx status is a failure.
    async fn send(&self, request: &WebhookRequest) -> Result<()>;
}

pub struct HttpWebhookSender {
    client: reqwest::Client,
}

impl HttpWebhookSender {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(NotifierError::HttpClient)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send(&self, request: &WebhookRequest) -> Result<()> {
        let kind = request.kind.to_string();
        let response = self
            .client
            .post(&request.url)
            .json(&request.body)
            .send()
            .await
            .map_err(|source| NotifierError::WebhookTransport {
                kind: kind.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::WebhookStatus {
                kind,
                status: status.as_u16(),
            });
        }

        tracing::debug!(kind = %kind, status = status.as_u16(), "Webhook delivered");
        Ok(())
    }
}
