//! Plain HTTP renderer tests using wiremock

mod common;

use std::time::Duration;

use common::{fast_render_options, load_fixture, PICK4_FALLBACK};
use pickdraw::config::SourcesConfig;
use pickdraw::crawler::{render_page, HttpRenderer, Scraper};
use pickdraw::models::Game;
use pickdraw::utils::error::RenderError;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_sends_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/games/draw-games/pick-4"))
        .and(header("user-agent", "pickdraw-test"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture(PICK4_FALLBACK)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let renderer = HttpRenderer::new().unwrap();
    let url = format!("{}/games/draw-games/pick-4", mock_server.uri());
    let body = render_page(&renderer, &url, &fast_render_options()).await.unwrap();

    assert!(body.contains("game-numbers"));
}

#[tokio::test]
async fn test_server_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let renderer = HttpRenderer::new().unwrap();
    let result = render_page(&renderer, &mock_server.uri(), &fast_render_options()).await;

    assert!(matches!(result, Err(RenderError::ServerError(503))));
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html></html>")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let mut options = fast_render_options();
    options.navigation_timeout = Duration::from_millis(200);

    let renderer = HttpRenderer::new().unwrap();
    let result = render_page(&renderer, &mock_server.uri(), &options).await;

    assert!(result.unwrap_err().is_timeout());
}

#[tokio::test]
async fn test_scrape_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pick-4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture(PICK4_FALLBACK)))
        .mount(&mock_server)
        .await;

    let sources = SourcesConfig {
        pick3_url: format!("{}/pick-3", mock_server.uri()),
        pick4_url: format!("{}/pick-4", mock_server.uri()),
    };
    let scraper = Scraper::new(
        std::sync::Arc::new(HttpRenderer::new().unwrap()),
        sources,
        fast_render_options(),
    );

    let records = scraper.scrape(Game::Pick4).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.game == Game::Pick4));

    // Nothing mounted for Pick 3
    assert!(scraper.scrape(Game::Pick3).await.is_err());
}
