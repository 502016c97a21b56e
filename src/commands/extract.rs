use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;

use pickdraw::parser::DrawExtractor;

use super::parse_game;

/// Extract draws from a saved page and print them with the strategy used
pub fn extract(file: &Path, game: &str) -> Result<()> {
    let game = parse_game(game)?;
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let document = scraper::Html::parse_document(&html);
    let extraction = DrawExtractor::new().extract_with_layout(&document, game);

    let response = json!({
        "ok": true,
        "game": game,
        "strategy": extraction.strategy.as_str(),
        "count": extraction.records.len(),
        "skipped": extraction.skipped.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "results": extraction.records,
    });
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
