//! Error types for the pickdraw pipeline
//!
//! This module defines the domain error types used throughout the application.

use thiserror::Error;

/// Errors that can occur while rendering a page
#[derive(Error, Debug)]
pub enum RenderError {
    /// Navigation (including network quiescence) exceeded its budget
    #[error("Navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    /// HTTP transport error talking to the page or the browser driver
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Page answered with a non-success status
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Browser session could not be created
    #[error("Failed to start browser session: {0}")]
    SessionStart(String),

    /// WebDriver command returned an error object
    #[error("WebDriver error ({error}): {message}")]
    WebDriver { error: String, message: String },

    /// Unexpected response body from the driver
    #[error("Malformed driver response: {0}")]
    MalformedResponse(String),
}

impl RenderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RenderError::NavigationTimeout { .. })
    }

    /// Transient failures worth another attempt on the next run
    pub fn is_recoverable(&self) -> bool {
        match self {
            RenderError::NavigationTimeout { .. } | RenderError::Http(_) => true,
            RenderError::ServerError(status) => *status >= 500,
            RenderError::SessionStart(_) => true,
            RenderError::WebDriver { .. } | RenderError::MalformedResponse(_) => false,
        }
    }
}

/// Errors that can occur during parsing operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Date text could not be parsed into a calendar date
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Unknown game identifier
    #[error("Invalid game (use PICK3 or PICK4): {0}")]
    InvalidGame(String),

    /// Unknown draw time label
    #[error("Invalid draw time: {0}")]
    InvalidDrawTime(String),
}

/// Errors reported by a draw store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The existence check signalled "no row" as an error
    #[error("No row found for {0}")]
    NotFound(String),

    /// Insert rejected by the natural-key uniqueness constraint
    #[error("Duplicate draw {0}")]
    UniqueViolation(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL error
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// HTTP transport error (PostgREST backend)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Store rejected the request with an error code
    #[error("Store rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// A stored row could not be decoded
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Internal lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_classification() {
        let timeout = RenderError::NavigationTimeout {
            url: "https://example.com".to_string(),
            timeout_secs: 30,
        };
        assert!(timeout.is_timeout());
        assert!(timeout.is_recoverable());
        assert!(timeout.to_string().contains("30s"));

        assert!(RenderError::ServerError(503).is_recoverable());
        assert!(!RenderError::ServerError(404).is_recoverable());
    }

    #[test]
    fn test_store_error_classification() {
        let dup = StoreError::UniqueViolation("PICK3 MIDDAY 2025-12-19".to_string());
        assert!(dup.is_unique_violation());
        assert!(!dup.is_not_found());

        assert!(StoreError::NotFound("x".to_string()).is_not_found());
    }

    #[test]
    fn test_invalid_game_message() {
        let err = ParseError::InvalidGame("PICK5".to_string());
        assert!(err.to_string().starts_with("Invalid game (use PICK3 or PICK4)"));
    }
}
