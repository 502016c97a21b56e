use anyhow::{Context, Result};
use serde_json::json;

use pickdraw::config::Config;

use super::{build_pipeline, build_scraper, parse_game};

/// Render one game and print the extracted draws as JSON
pub async fn scrape(config: Config, game: &str) -> Result<()> {
    let game = parse_game(game)?;
    let scraper = build_scraper(&config)?;

    let results = scraper
        .scrape(game)
        .await
        .with_context(|| format!("Failed to scrape {game}"))?;

    let response = json!({
        "ok": true,
        "game": game,
        "count": results.len(),
        "results": results,
    });
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

/// Run the pipeline once and print the report
pub async fn retrieve(config: Config) -> Result<()> {
    let pipeline = build_pipeline(&config).await?;
    let report = pipeline.run().await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    eprintln!(
        "PICK3: {}  PICK4: {}  stored: {}  skipped: {}",
        report.summary.pick3, report.summary.pick4, report.summary.stored, report.summary.skipped
    );

    Ok(())
}
