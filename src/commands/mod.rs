pub mod extract;
pub mod recent;
pub mod run;
pub mod serve;

use anyhow::{Context, Result};
use std::sync::Arc;

use pickdraw::config::Config;
use pickdraw::crawler::{renderer_from_config, RenderOptions, Scraper};
use pickdraw::ingest::{IngestOptions, IngestionCoordinator, RetrievalPipeline};
use pickdraw::models::Game;
use pickdraw::notifications::Notifier;
use pickdraw::storage;

// Re-export command functions for convenience
pub use extract::extract;
pub use recent::recent;
pub use run::{retrieve, scrape};
pub use serve::serve;

/// Scraper wired from configuration
pub fn build_scraper(config: &Config) -> Result<Scraper> {
    let renderer = renderer_from_config(&config.renderer)?;
    Ok(Scraper::new(
        renderer,
        config.sources.clone(),
        RenderOptions::from_config(&config.renderer),
    ))
}

/// Full pipeline wired from configuration
pub async fn build_pipeline(config: &Config) -> Result<RetrievalPipeline> {
    let scraper = Arc::new(build_scraper(config)?);
    let repository = storage::connect(&config.database).await?;
    let coordinator = IngestionCoordinator::new(repository, IngestOptions::from(&config.ingest));
    let notifier =
        Notifier::from_config(&config.notifications).context("Invalid notification settings")?;

    if notifier.is_empty() {
        tracing::info!("No notification channel configured");
    }

    Ok(RetrievalPipeline::new(scraper, coordinator, notifier))
}

pub fn parse_game(game: &str) -> Result<Game> {
    game.parse::<Game>().map_err(Into::into)
}
