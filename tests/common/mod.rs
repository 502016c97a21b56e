//! Common test utilities

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use pickdraw::crawler::{PageRenderer, RenderOptions, RenderSession};
use pickdraw::models::{DrawRecord, DrawTime, Game};
use pickdraw::utils::error::RenderError;

/// Structured Pick 3 page: header card with a Midday and an Evening draw
pub const PICK3_STRUCTURED: &str = "pick3_structured.html";

/// Pick 4 page without the header card
pub const PICK4_FALLBACK: &str = "pick4_fallback.html";

/// Pick 3 page where most blocks are broken
pub const PICK3_MALFORMED: &str = "pick3_malformed.html";

/// Pick 3 card where some blocks lack a list, an icon or a container
pub const PICK3_MISSING_LIST: &str = "pick3_missing_list.html";

/// Pick 4 page without the card where some labels lack a list or a container
pub const PICK4_MISSING_LIST: &str = "pick4_missing_list.html";

/// Load an HTML fixture by file name
pub fn load_fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/html")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Create a test record with default values
pub fn create_test_record() -> DrawRecord {
    create_record(Game::Pick3, DrawTime::Midday, date(2025, 12, 19), "407", "2")
}

pub fn create_record(
    game: Game,
    draw_time: DrawTime,
    date: NaiveDate,
    numbers: &str,
    fireball: &str,
) -> DrawRecord {
    DrawRecord {
        game,
        draw_time,
        date,
        numbers: numbers.to_string(),
        fireball: fireball.to_string(),
    }
}

/// A week of draws for `game`, both times per day
pub fn create_week(game: Game) -> Vec<DrawRecord> {
    let digits = game.digit_count();
    (1..=7)
        .flat_map(|day| {
            [DrawTime::Midday, DrawTime::Evening]
                .into_iter()
                .map(move |time| (day, time))
        })
        .map(|(day, time)| {
            let numbers: String = (0..digits)
                .map(|i| char::from(b'0' + ((day as usize + i) % 10) as u8))
                .collect();
            create_record(game, time, date(2025, 12, day), &numbers, "")
        })
        .collect()
}

/// Options that keep renderer tests fast
pub fn fast_render_options() -> RenderOptions {
    RenderOptions {
        navigation_timeout: std::time::Duration::from_secs(5),
        network_idle: std::time::Duration::from_millis(20),
        wait_selector: Some(pickdraw::parser::selectors::CARD.to_string()),
        selector_timeout: std::time::Duration::from_millis(200),
        settle_delay: std::time::Duration::ZERO,
        poll_interval: std::time::Duration::from_millis(5),
        user_agent: "pickdraw-test".to_string(),
    }
}

/// Renderer that serves canned HTML per URL substring
pub struct StaticRenderer {
    pages: Vec<(String, Result<String, u16>)>,
}

impl StaticRenderer {
    pub fn new() -> Self {
        Self { pages: Vec::new() }
    }

    pub fn page(mut self, url_part: &str, html: String) -> Self {
        self.pages.push((url_part.to_string(), Ok(html)));
        self
    }

    pub fn failing(mut self, url_part: &str, status: u16) -> Self {
        self.pages.push((url_part.to_string(), Err(status)));
        self
    }

    pub fn shared(self) -> Arc<dyn PageRenderer> {
        Arc::new(self)
    }
}

struct StaticSession {
    pages: Vec<(String, Result<String, u16>)>,
}

#[async_trait]
impl PageRenderer for StaticRenderer {
    fn name(&self) -> &str {
        "static"
    }

    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Ok(Box::new(StaticSession {
            pages: self.pages.clone(),
        }))
    }
}

#[async_trait]
impl RenderSession for StaticSession {
    async fn render(&mut self, url: &str, _options: &RenderOptions) -> Result<String, RenderError> {
        match self.pages.iter().find(|(part, _)| url.contains(part.as_str())) {
            Some((_, Ok(html))) => Ok(html.clone()),
            Some((_, Err(status))) => Err(RenderError::ServerError(*status)),
            None => Err(RenderError::ServerError(404)),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        Ok(())
    }
}
