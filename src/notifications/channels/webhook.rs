//! Webhook notification channel
//!
//! Posts the run report as JSON to a downstream endpoint (an automation
//! workflow, a chat bridge, ...).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::config::NotificationsConfig;
use crate::models::RunReport;
use crate::utils::retry::{with_retry_if, RetryConfig};
use crate::utils::truncate_text;

/// Longest response body echoed into an error message
const MAX_ERROR_BODY: usize = 200;

/// Where and how the run report is posted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Receiving endpoint
    pub url: String,
    /// Sent as `Authorization: Bearer ...` when set
    pub auth_token: Option<String>,
    /// Extra headers, e.g. a workflow secret
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Retries after the first attempt
    #[serde(default)]
    pub max_retries: u32,
    /// Base backoff delay between retries
    #[serde(default = "default_backoff")]
    pub backoff_ms: u64,
}

fn default_timeout() -> u64 {
    10
}

fn default_backoff() -> u64 {
    1000
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            headers: HashMap::new(),
            timeout_secs: default_timeout(),
            max_retries: 0,
            backoff_ms: default_backoff(),
        }
    }

    /// Build from the `[notifications]` section; `None` when no URL is set
    pub fn from_notifications(config: &NotificationsConfig) -> Option<Self> {
        let url = config.webhook_url.as_ref()?;
        let mut webhook = Self::new(url.clone())
            .with_timeout(config.timeout_secs)
            .with_max_retries(config.max_retries);
        webhook.auth_token = config.webhook_token.clone();
        Some(webhook)
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set max retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base backoff delay
    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    /// Reject non-http(s) URLs and a zero timeout
    pub fn validate(&self) -> Result<(), String> {
        let parsed = url::Url::parse(&self.url).map_err(|e| format!("Invalid webhook URL: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err("Webhook URL must use http or https".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Webhook notification channel
///
/// # Payload Format
///
/// ```json
/// {
///   "ok": true,
///   "summary": { "pick3": 2, "pick4": 2, "total": 4, "stored": 1, "skipped": 3 },
///   "results": [
///     { "game": "PICK3", "drawTime": "EVENING", "date": "2025-12-19", "numbers": "407", "fireball": "2" }
///   ]
/// }
/// ```
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    pub fn new(config: WebhookConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Channel with default settings for `url`
    pub fn from_url(url: impl Into<String>) -> ChannelResult<Self> {
        Self::new(WebhookConfig::new(url))
    }

    /// Get the webhook URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn post(&self, payload: &serde_json::Value) -> ChannelResult<()> {
        let mut request = self.client.post(&self.config.url);

        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let response = request.json(payload).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        Err(ChannelError::Rejected {
            status: status.as_u16(),
            body: truncate_text(&body, MAX_ERROR_BODY),
        })
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, report: &RunReport) -> ChannelResult<DeliveryStatus> {
        let payload = serde_json::to_value(report)?;
        let retry = RetryConfig::with_delays(
            self.config.max_retries,
            self.config.backoff_ms,
            self.config.backoff_ms.saturating_mul(30),
        );

        match with_retry_if(&retry, || self.post(&payload), ChannelError::is_recoverable).await {
            Ok(()) => {
                tracing::info!(url = %self.config.url, "Webhook delivered");
                Ok(DeliveryStatus::success(
                    "webhook",
                    format!("Delivered to {}", self.config.url),
                ))
            }
            Err(e) => {
                tracing::warn!(url = %self.config.url, error = %e, "Webhook delivery failed");
                Ok(DeliveryStatus::failure("webhook", e.to_string()))
            }
        }
    }
}
