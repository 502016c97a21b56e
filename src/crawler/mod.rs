//! Results page scraping
//!
//! This module renders a game's results page through a [`PageRenderer`] and
//! feeds the settled DOM to the draw extractor.

pub mod http;
pub mod render;
pub mod webdriver;

use anyhow::{Context, Result};
use scraper::Html;
use std::sync::Arc;

use crate::config::{RendererBackend, RendererConfig, SourcesConfig};
use crate::metrics;
use crate::models::{DrawRecord, Game};
use crate::parser::DrawExtractor;
use crate::utils::error::RenderError;

pub use self::http::HttpRenderer;
pub use self::render::{render_page, PageRenderer, RenderOptions, RenderSession};
pub use self::webdriver::WebDriverRenderer;

/// Shared renderer handle
pub type SharedRenderer = Arc<dyn PageRenderer>;

/// Build the renderer selected by configuration
pub fn renderer_from_config(config: &RendererConfig) -> Result<SharedRenderer> {
    let renderer: SharedRenderer = match config.backend {
        RendererBackend::Webdriver => Arc::new(
            WebDriverRenderer::new(config).context("Failed to create WebDriver renderer")?,
        ),
        RendererBackend::Http => {
            Arc::new(HttpRenderer::new().context("Failed to create HTTP renderer")?)
        }
    };
    Ok(renderer)
}

/// Renders results pages and extracts draws from them
pub struct Scraper {
    renderer: SharedRenderer,
    extractor: DrawExtractor,
    sources: SourcesConfig,
    options: RenderOptions,
}

impl Scraper {
    pub fn new(renderer: SharedRenderer, sources: SourcesConfig, options: RenderOptions) -> Self {
        Self {
            renderer,
            extractor: DrawExtractor::new(),
            sources,
            options,
        }
    }

    /// Results page for `game`
    pub fn url_for(&self, game: Game) -> &str {
        self.sources.url_for(game)
    }

    /// Render the results page for `game` and extract its draws
    ///
    /// An empty vector is a valid outcome (the page rendered but no block was
    /// complete). Render failures are returned to the caller.
    pub async fn scrape(&self, game: Game) -> Result<Vec<DrawRecord>, RenderError> {
        let url = self.url_for(game);
        tracing::info!(
            game = %game,
            url,
            renderer = self.renderer.name(),
            "Rendering results page"
        );

        let html = {
            let _timer = metrics::start_render_timer(game.as_str());
            render_page(self.renderer.as_ref(), url, &self.options).await
        };

        let html = html.map_err(|e| {
            let kind = if e.is_timeout() { "timeout" } else { "error" };
            metrics::record_render_failure(game.as_str(), kind);
            tracing::error!(game = %game, url, error = %e, "Render failed");
            e
        })?;

        tracing::debug!(game = %game, bytes = html.len(), "Rendered page");

        // The parsed document is not Send; keep it out of any await
        let records = {
            let document = Html::parse_document(&html);
            self.extractor.extract(&document, game)
        };

        tracing::info!(game = %game, count = records.len(), "Extracted draws");
        Ok(records)
    }
}
