use anyhow::{Context, Result};

use pickdraw::config::Config;
use pickdraw::storage;

use super::parse_game;

/// Print the most recent stored draws as a table
pub async fn recent(config: Config, game: Option<&str>, limit: usize) -> Result<()> {
    let game = game.map(parse_game).transpose()?;
    let repository = storage::connect(&config.database).await?;

    let draws = repository
        .recent(game, limit)
        .await
        .context("Failed to read recent draws")?;

    if draws.is_empty() {
        println!("No draws stored yet.");
        return Ok(());
    }

    println!("{:<6} {:<10} {:<8} {:<7} {}", "GAME", "DATE", "TIME", "NUMBERS", "FIREBALL");
    for draw in draws {
        println!(
            "{:<6} {:<10} {:<8} {:<7} {}",
            draw.game.as_str(),
            draw.date.format("%Y-%m-%d").to_string(),
            draw.draw_time.as_str(),
            draw.numbers,
            draw.fireball.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
