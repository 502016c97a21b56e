//! pickdraw - Pick 3 / Pick 4 draw result ingestion
//!
//! Renders the public results pages, extracts draw records from the DOM,
//! stores each draw exactly once and relays a run summary downstream.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Page rendering (WebDriver, plain HTTP) and scraping
//! - [`parser`] - Date normalization and two-tier draw extraction
//! - [`models`] - Core data structures and types
//! - [`storage`] - Draw stores (SQLite, PostgreSQL, PostgREST, memory)
//! - [`ingest`] - Idempotent ingestion and the retrieve pipeline
//! - [`notifications`] - Best-effort run report relay
//! - [`server`] - HTTP API
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use pickdraw::parser::DrawExtractor;
//! use pickdraw::models::Game;
//!
//! let html = std::fs::read_to_string("pick-3.html").unwrap();
//! let records = DrawExtractor::new().extract_html(&html, Game::Pick3);
//! for record in records {
//!     println!("{} {} {}", record.date, record.draw_time, record.numbers);
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod parser;
pub mod server;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{PageRenderer, RenderOptions, Scraper};
    pub use crate::error::{Error, ErrorCategory, PickdrawErrorTrait, Result};
    pub use crate::ingest::{IngestOptions, IngestionCoordinator, RetrievalPipeline};
    pub use crate::models::{DrawRecord, DrawTime, Game, IngestStats, RunReport};
    pub use crate::parser::DrawExtractor;
    pub use crate::storage::{DrawRepository, SharedDrawRepository};
}

// Direct re-exports for convenience
pub use models::{DrawRecord, DrawTime, Game, IngestStats, RunReport, RunSummary};
