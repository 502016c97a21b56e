//! Notification channels for relaying run reports
//!
//! A channel delivers the run report to one downstream system. Delivery is
//! best-effort: callers log failures and move on.

pub mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::RunReport;

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Why a report could not be handed to a channel
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ChannelError {
    /// Transport failures and server errors may succeed on retry; client
    /// errors will not
    pub fn is_recoverable(&self) -> bool {
        match self {
            ChannelError::HttpError(_) => true,
            ChannelError::Rejected { status, .. } => *status >= 500 || *status == 429,
            ChannelError::InvalidConfig(_) | ChannelError::SerializationError(_) => false,
        }
    }
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    pub success: bool,
    /// Channel name
    pub channel: String,
    pub message: Option<String>,
    /// When the attempt finished
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    pub fn success(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {}", self.channel)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// Destination for run reports
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Deliver a run report through this channel
    ///
    /// Delivery failures are reported in the returned status; `Err` is
    /// reserved for failures before anything was sent.
    async fn send(&self, report: &RunReport) -> ChannelResult<DeliveryStatus>;
}
