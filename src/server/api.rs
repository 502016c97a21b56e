//! REST API handlers
//!
//! - `GET  /api/scrape?game=PICK3|PICK4` - render and extract one game, no writes
//! - `POST /api/retrieve` - full run (scrape both, ingest, notify)
//! - `GET  /api/health` - liveness
//! - `GET  /metrics` - Prometheus exposition

use std::str::FromStr;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorCategory, PickdrawErrorTrait, Result};
use crate::metrics;
use crate::models::{DrawRecord, Game};

use super::AppState;

/// Message returned for an unknown `game` parameter
pub const INVALID_GAME_MESSAGE: &str = "Invalid game (use PICK3 or PICK4)";

// ============================================================================
// API Response Types
// ============================================================================

/// Error body shared by all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: message.into(),
        }
    }
}

/// Successful single-game scrape
#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub ok: bool,
    pub game: Game,
    pub count: usize,
    pub results: Vec<DrawRecord>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    pub game: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

fn observe(endpoint: &str, started: Instant, response: Response) -> Response {
    metrics::record_api_request(
        endpoint,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Build the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/scrape", get(scrape))
        .route("/api/retrieve", post(retrieve))
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Game named by the query; PICK3 when absent or blank
fn requested_game(param: Option<&str>) -> Result<Game> {
    match param.map(str::trim).filter(|name| !name.is_empty()) {
        None => Ok(Game::Pick3),
        Some(name) => Ok(Game::from_str(name)?),
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err.category() {
        ErrorCategory::Parsing => StatusCode::BAD_REQUEST,
        ErrorCategory::Network => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure_response(err: &Error) -> Response {
    let message = match err {
        Error::Parse(_) => INVALID_GAME_MESSAGE.to_string(),
        Error::Render { .. } => err.to_string(),
    };
    error_response(status_for(err), message)
}

/// Render and extract one game without storing anything
async fn scrape(State(state): State<AppState>, Query(params): Query<ScrapeParams>) -> Response {
    let started = Instant::now();

    let game = match requested_game(params.game.as_deref()) {
        Ok(game) => game,
        Err(e) => return observe("/api/scrape", started, failure_response(&e)),
    };

    let response = match state.pipeline.scraper().scrape(game).await {
        Ok(results) => Json(ScrapeResponse {
            ok: true,
            game,
            count: results.len(),
            results,
        })
        .into_response(),
        Err(e) => failure_response(&Error::render(game, e)),
    };

    observe("/api/scrape", started, response)
}

/// Run the full pipeline once
async fn retrieve(State(state): State<AppState>) -> Response {
    let started = Instant::now();

    let response = match state.pipeline.run().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            tracing::error!(error = %e, category = e.category().as_str(), "Retrieve run failed");
            failure_response(&e)
        }
    };

    observe("/api/retrieve", started, response)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Prometheus text exposition
async fn metrics_handler() -> Response {
    match metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_game_defaults_when_absent_or_blank() {
        assert_eq!(requested_game(None).unwrap(), Game::Pick3);
        assert_eq!(requested_game(Some("")).unwrap(), Game::Pick3);
        assert_eq!(requested_game(Some("  \t")).unwrap(), Game::Pick3);
        assert_eq!(requested_game(Some(" pick4 ")).unwrap(), Game::Pick4);
    }

    #[test]
    fn test_unknown_game_is_bad_request() {
        let err = requested_game(Some("LOTTO")).unwrap_err();
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_render_failure_is_server_error() {
        let err = Error::render(Game::Pick4, crate::error::RenderError::ServerError(502));
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("PICK4"));
    }
}
