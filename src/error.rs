//! Unified error handling for the pickdraw crate
//!
//! Render, store and relay failures each keep their own error type. This
//! module carries the failures that end a request or a run: a bad game name
//! from a caller, or a results page that could not be rendered, tagged with
//! its game.
//!
//! ```rust,ignore
//! use pickdraw::error::{Error, PickdrawErrorTrait};
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = err.category().as_str(), "{}", err.describe());
//!     } else {
//!         tracing::error!(error = %err, "Run aborted");
//!     }
//! }
//! ```

use thiserror::Error;

use crate::models::Game;

pub use crate::utils::error::{ParseError, RenderError};

/// Common trait for pickdraw error types
pub trait PickdrawErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a later run may succeed)
    fn is_recoverable(&self) -> bool;

    /// Short user-facing description
    fn describe(&self) -> String;

    /// Coarse bucket used in logs
    fn category(&self) -> ErrorCategory;
}

/// Where a failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rendering and transport errors (browser, HTTP, timeouts)
    Network,
    /// Caller input such as game names
    Parsing,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
        }
    }
}

/// Unified error type for the pickdraw crate
#[derive(Error, Debug)]
pub enum Error {
    /// Rendering a game's results page failed
    #[error("Render error for {game}: {source}")]
    Render {
        game: Game,
        #[source]
        source: RenderError,
    },

    /// Parse-specific errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl PickdrawErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Render { source, .. } => source.is_recoverable(),
            Self::Parse(_) => false,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Render { game, source } if source.is_timeout() => {
                format!("{game} results page did not finish loading in time")
            }
            Self::Render { game, .. } => format!("{game} results page could not be rendered"),
            Self::Parse(e) => e.to_string(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Render { .. } => ErrorCategory::Network,
            Self::Parse(_) => ErrorCategory::Parsing,
        }
    }
}

impl Error {
    /// Wrap a render failure for `game`
    pub fn render(game: Game, source: RenderError) -> Self {
        Self::Render { game, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
