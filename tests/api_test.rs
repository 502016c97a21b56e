//! HTTP API tests driven through the router with tower's `oneshot`

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{load_fixture, StaticRenderer, PICK3_STRUCTURED, PICK4_FALLBACK};
use pickdraw::config::SourcesConfig;
use pickdraw::crawler::{RenderOptions, Scraper};
use pickdraw::ingest::{IngestOptions, IngestionCoordinator, RetrievalPipeline};
use pickdraw::notifications::Notifier;
use pickdraw::server::{create_router, AppState};
use pickdraw::storage::{DrawRepository, MemoryDrawRepository};
use serde_json::Value;
use tower::ServiceExt;

fn app(renderer: StaticRenderer, repo: Arc<MemoryDrawRepository>) -> Router {
    let scraper = Scraper::new(
        renderer.shared(),
        SourcesConfig::default(),
        RenderOptions::default(),
    );
    let coordinator = IngestionCoordinator::new(repo, IngestOptions::default());
    let pipeline = RetrievalPipeline::new(Arc::new(scraper), coordinator, Notifier::new());
    create_router(AppState::new(Arc::new(pipeline)))
}

fn healthy_site() -> StaticRenderer {
    StaticRenderer::new()
        .page("pick-3", load_fixture(PICK3_STRUCTURED))
        .page("pick-4", load_fixture(PICK4_FALLBACK))
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_invalid_game_is_rejected_before_rendering() {
    // Rendering anything would fail; the 400 must come first
    let app = app(StaticRenderer::new(), Arc::new(MemoryDrawRepository::new()));

    let (status, body) = call(app, get("/api/scrape?game=LOTTO")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        serde_json::json!({ "ok": false, "error": "Invalid game (use PICK3 or PICK4)" })
    );
}

#[tokio::test]
async fn test_scrape_defaults_to_pick3() {
    let app = app(healthy_site(), Arc::new(MemoryDrawRepository::new()));

    let (status, body) = call(app, get("/api/scrape")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["game"], "PICK3");
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["drawTime"], "MIDDAY");
    assert_eq!(body["results"][0]["fireball"], "2");
}

#[tokio::test]
async fn test_blank_game_defaults_to_pick3() {
    for uri in ["/api/scrape?game=", "/api/scrape?game=%20%20"] {
        let app = app(healthy_site(), Arc::new(MemoryDrawRepository::new()));

        let (status, body) = call(app, get(uri)).await;

        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["game"], "PICK3", "{uri}");
        assert_eq!(body["count"], 2, "{uri}");
    }
}

#[tokio::test]
async fn test_scrape_does_not_store() {
    let repo = Arc::new(MemoryDrawRepository::new());
    let app = app(healthy_site(), repo.clone());

    let (status, body) = call(app, get("/api/scrape?game=pick4")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game"], "PICK4");
    assert_eq!(body["count"], 2);
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_scrape_render_failure_is_500() {
    let app = app(
        StaticRenderer::new().failing("pick-3", 503),
        Arc::new(MemoryDrawRepository::new()),
    );

    let (status, body) = call(app, get("/api/scrape?game=PICK3")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Render error for PICK3"), "{message}");
    assert!(message.contains("503"));
}

#[tokio::test]
async fn test_retrieve_stores_then_skips() {
    let repo = Arc::new(MemoryDrawRepository::new());

    let (status, body) = call(app(healthy_site(), repo.clone()), post("/api/retrieve")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(
        body["summary"],
        serde_json::json!({ "pick3": 2, "pick4": 2, "total": 4, "stored": 4, "skipped": 0 })
    );
    assert_eq!(body["results"].as_array().unwrap().len(), 4);
    assert_eq!(body["results"][0]["game"], "PICK3");
    assert_eq!(body["results"][2]["game"], "PICK4");

    let (status, body) = call(app(healthy_site(), repo.clone()), post("/api/retrieve")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["stored"], 0);
    assert_eq!(body["summary"]["skipped"], 4);
    assert_eq!(repo.count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_retrieve_fails_whole_run_when_one_game_fails() {
    let repo = Arc::new(MemoryDrawRepository::new());
    let renderer = StaticRenderer::new()
        .page("pick-3", load_fixture(PICK3_STRUCTURED))
        .failing("pick-4", 500);

    let (status, body) = call(app(renderer, repo.clone()), post("/api/retrieve")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());
    assert_eq!(repo.count().await.unwrap(), 0, "nothing is written on a failed run");
}

#[tokio::test]
async fn test_health() {
    let app = app(StaticRenderer::new(), Arc::new(MemoryDrawRepository::new()));

    let (status, body) = call(app, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_exposition() {
    pickdraw::metrics::init_metrics().unwrap();
    let app = app(healthy_site(), Arc::new(MemoryDrawRepository::new()));

    // Produce at least one sample
    let (status, _) = call(app.clone(), get("/api/scrape")).await;
    assert_eq!(status, StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("pickdraw_draws_extracted_total"));
}
