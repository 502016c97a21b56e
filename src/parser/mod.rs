//! HTML parsing and data extraction
//!
//! This module handles parsing rendered draw-game pages and extracting
//! structured draw records.

pub mod date;
pub mod html;
pub mod selectors;

// Re-export main extractor and public types
pub use date::{normalize_date, normalize_date_iso};
pub use html::{DrawExtractor, Extraction, ExtractionStrategy, Layout, SkipReason};
pub use selectors::DrawSelectors;
