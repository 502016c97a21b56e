//! PostgREST (Supabase) draw store
//!
//! Rows live behind a PostgREST endpoint at `{base}/rest/v1/{table}`.
//! Two server signals matter:
//!
//! - `PGRST116` on a single-object lookup: no row matched. Mapped to
//!   `StoreError::NotFound`, which ingestion reads as "not stored yet".
//! - `23505` on insert: the unique key already exists. Mapped to
//!   `StoreError::UniqueViolation`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::repository::{decode_row, DrawRepository};
use crate::models::{DrawKey, DrawRecord, Game, StoredDraw};
use crate::utils::error::StoreError;

/// Error code PostgREST returns when a single-object request matched no row
pub const NO_ROWS_CODE: &str = "PGRST116";

/// PostgreSQL SQLSTATE for unique violations
pub const UNIQUE_VIOLATION_CODE: &str = "23505";

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

const COLUMNS: &str = "id,type,draw_date,draw_time,result,fireball";

/// Row as exchanged with PostgREST
#[derive(Debug, Serialize, Deserialize)]
struct Row {
    #[serde(skip_serializing)]
    id: Option<i64>,
    #[serde(rename = "type")]
    game: String,
    draw_date: String,
    draw_time: String,
    result: String,
    fireball: Option<String>,
}

impl Row {
    fn from_record(record: &DrawRecord) -> Self {
        Self {
            id: None,
            game: record.game.as_str().to_string(),
            draw_date: record.date.format("%Y-%m-%d").to_string(),
            draw_time: record.draw_time.as_str().to_string(),
            result: record.numbers.clone(),
            fireball: record.fireball_opt().map(str::to_string),
        }
    }

    fn decode(self) -> Result<StoredDraw, StoreError> {
        decode_row(
            self.id.unwrap_or_default(),
            &self.game,
            &self.draw_date,
            &self.draw_time,
            self.result,
            self.fireball,
        )
    }
}

/// PostgREST error body
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// PostgREST implementation of DrawRepository
pub struct PostgrestDrawRepository {
    client: Client,
    endpoint: String,
}

impl PostgrestDrawRepository {
    /// # Errors
    ///
    /// Returns `StoreError::Pool` if the API key is not a valid header value,
    /// `StoreError::Http` if the client cannot be created
    pub fn new(base_url: &str, api_key: Option<&str>, table: &str) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let invalid = |_| StoreError::Pool("API key is not a valid header value".to_string());
            headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid)?);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()?;

        let base = base_url.trim_end_matches('/');
        let root = if base.ends_with("/rest/v1") {
            base.to_string()
        } else {
            format!("{base}/rest/v1")
        };

        Ok(Self {
            client,
            endpoint: format!("{root}/{table}"),
        })
    }

    /// Table endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn select(&self) -> RequestBuilder {
        self.client
            .get(&self.endpoint)
            .query(&[("select", COLUMNS)])
    }
}

/// Turn a non-success response into a store error
async fn rejection(response: Response) -> StoreError {
    let status = response.status();
    let body = response.json::<ApiError>().await.unwrap_or_default();
    let code = body.code.unwrap_or_else(|| status.as_u16().to_string());
    let message = body.message.unwrap_or_else(|| status.to_string());

    StoreError::Rejected { code, message }
}

fn parse_total(content_range: &str) -> Option<usize> {
    content_range.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl DrawRepository for PostgrestDrawRepository {
    fn name(&self) -> &str {
        "postgrest"
    }

    async fn find(&self, key: &DrawKey) -> Result<Option<StoredDraw>, StoreError> {
        let response = self
            .select()
            .query(&[
                ("type", format!("eq.{}", key.game.as_str())),
                ("draw_date", format!("eq.{}", key.date.format("%Y-%m-%d"))),
                ("draw_time", format!("eq.{}", key.draw_time.as_str())),
            ])
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;

        if response.status().is_success() {
            let row: Row = response.json().await?;
            return row.decode().map(Some);
        }

        match rejection(response).await {
            StoreError::Rejected { code, .. } if code == NO_ROWS_CODE => {
                Err(StoreError::NotFound(key.to_string()))
            }
            other => Err(other),
        }
    }

    async fn insert(&self, record: &DrawRecord) -> Result<StoredDraw, StoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&Row::from_record(record))
            .send()
            .await?;

        if response.status().is_success() {
            let row: Row = response.json().await?;
            return row.decode();
        }

        match rejection(response).await {
            StoreError::Rejected { code, .. } if code == UNIQUE_VIOLATION_CODE => {
                Err(StoreError::UniqueViolation(record.key().to_string()))
            }
            other => Err(other),
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("select", "id"), ("limit", "1")])
            .header("Prefer", "count=exact")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_total)
            .ok_or_else(|| StoreError::CorruptRow("missing Content-Range total".to_string()))
    }

    async fn recent(
        &self,
        game: Option<Game>,
        limit: usize,
    ) -> Result<Vec<StoredDraw>, StoreError> {
        let mut request = self.select().query(&[
            ("order", "draw_date.desc,draw_time.asc,id.desc".to_string()),
            ("limit", limit.to_string()),
        ]);
        if let Some(game) = game {
            request = request.query(&[("type", format!("eq.{}", game.as_str()))]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let rows: Vec<Row> = response.json().await?;
        rows.into_iter().map(Row::decode).collect()
    }
}
