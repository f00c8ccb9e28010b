//! Notification Transport
//!
//! Delivers one-shot stream-webhook calls to downstream tasks.
//! This is a stateless HTTP client: no authentication header, no retry.
//! The caller only learns the response status.

use async_trait::async_trait;
use deploybot_core::dto::webhook::StreamWebhook;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while delivering a notification
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failure, timeout or malformed URL
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The receiver answered with a non-2xx status
    #[error("webhook returned status {0}")]
    Status(u16),
}

/// Transport trait for delivering trigger notifications
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// POSTs `body` to `url`
    ///
    /// # Returns
    /// The HTTP status of a successful (2xx) delivery
    async fn deliver(&self, url: &str, body: &StreamWebhook) -> Result<u16, TransportError>;
}

/// HTTP implementation of NotificationTransport
#[derive(Debug, Clone)]
pub struct WebhookTransport {
    client: Client,
}

impl WebhookTransport {
    /// Creates a transport whose every call is bounded by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NotificationTransport for WebhookTransport {
    async fn deliver(&self, url: &str, body: &StreamWebhook) -> Result<u16, TransportError> {
        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(status.as_u16())
    }
}
