//! Best-effort relay of run reports to downstream systems
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │               Notifier                     │
//! │  - fans a RunReport out to every channel   │
//! │  - logs and counts failures, never raises  │
//! └────────────────────────────────────────────┘
//!                     │
//!                     ▼
//!               ┌─────────┐
//!               │ Webhook │
//!               │ Channel │
//!               └─────────┘
//! ```

pub mod channels;

use std::sync::Arc;

use crate::config::NotificationsConfig;
use crate::metrics;
use crate::models::RunReport;

pub use channels::webhook::{WebhookChannel, WebhookConfig};
pub use channels::{Channel, ChannelError, ChannelResult, DeliveryStatus};

/// Fan-out over the configured channels
#[derive(Clone, Default)]
pub struct Notifier {
    channels: Vec<Arc<dyn Channel>>,
}

impl Notifier {
    /// Notifier with no channels (delivery is a no-op)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[notifications]` section
    pub fn from_config(config: &NotificationsConfig) -> ChannelResult<Self> {
        let mut notifier = Self::new();
        if let Some(webhook) = WebhookConfig::from_notifications(config) {
            notifier.add_channel(Arc::new(WebhookChannel::new(webhook)?));
        }
        Ok(notifier)
    }

    pub fn add_channel(&mut self, channel: Arc<dyn Channel>) {
        tracing::debug!(channel = channel.name(), "Registered notification channel");
        self.channels.push(channel);
    }

    pub fn with_channel(mut self, channel: Arc<dyn Channel>) -> Self {
        self.add_channel(channel);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Deliver `report` to every channel
    ///
    /// Never fails: each outcome is logged and counted, and the statuses are
    /// returned for callers that want to show them.
    pub async fn notify(&self, report: &RunReport) -> Vec<DeliveryStatus> {
        let mut statuses = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let status = match channel.send(report).await {
                Ok(status) => status,
                Err(e) => DeliveryStatus::failure(channel.name(), e.to_string()),
            };

            metrics::record_notification(channel.name(), status.success);
            if status.success {
                tracing::info!(channel = channel.name(), "Run report delivered");
            } else {
                tracing::warn!(
                    channel = channel.name(),
                    message = status.message.as_deref().unwrap_or_default(),
                    "Run report not delivered"
                );
            }

            statuses.push(status);
        }

        statuses
    }
}
