//! PostgreSQL draw store
//!
//! Pooled with deadpool. Unique-key rejections surface as SQLSTATE 23505
//! and are mapped to `StoreError::UniqueViolation`.

use async_trait::async_trait;
use deadpool_postgres::{
    Config as PoolConfig, ManagerConfig, Pool, PoolConfig as SizeConfig, RecyclingMethod, Runtime,
};
use tokio_postgres::error::SqlState;
use tokio_postgres::NoTls;

use super::repository::{decode_row, DrawRepository};
use crate::models::{DrawKey, DrawRecord, Game, StoredDraw};
use crate::utils::error::StoreError;

/// PostgreSQL implementation of DrawRepository
pub struct PostgresDrawRepository {
    pool: Pool,
    table: String,
}

impl PostgresDrawRepository {
    /// Create the pool and make sure the table exists
    pub async fn connect(url: &str, pool_size: usize, table: &str) -> Result<Self, StoreError> {
        let mut cfg = PoolConfig::new();
        cfg.url = Some(url.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(SizeConfig::new(pool_size));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        let repo = Self {
            pool,
            table: table.to_string(),
        };
        repo.create_schema().await?;

        tracing::info!(table, "PostgreSQL draw store initialized");
        Ok(repo)
    }

    async fn client(&self) -> Result<deadpool_postgres::Object, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        let table = &self.table;
        self.client()
            .await?
            .batch_execute(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id BIGSERIAL PRIMARY KEY,
                    type TEXT NOT NULL,
                    draw_date DATE NOT NULL,
                    draw_time TEXT NOT NULL,
                    result TEXT NOT NULL,
                    fireball TEXT,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    UNIQUE (type, draw_date, draw_time)
                );

                CREATE INDEX IF NOT EXISTS idx_{table}_draw_date ON {table}(draw_date);
                "#
            ))
            .await?;
        Ok(())
    }
}

fn decode(row: &tokio_postgres::Row) -> Result<StoredDraw, StoreError> {
    let date: chrono::NaiveDate = row.try_get(2)?;
    decode_row(
        row.try_get(0)?,
        row.try_get::<_, &str>(1)?,
        &date.format("%Y-%m-%d").to_string(),
        row.try_get::<_, &str>(3)?,
        row.try_get(4)?,
        row.try_get(5)?,
    )
}

#[async_trait]
impl DrawRepository for PostgresDrawRepository {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn find(&self, key: &DrawKey) -> Result<Option<StoredDraw>, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                &format!(
                    "SELECT id, type, draw_date, draw_time, result, fireball FROM {}
                     WHERE type = $1 AND draw_date = $2 AND draw_time = $3",
                    self.table
                ),
                &[&key.game.as_str(), &key.date, &key.draw_time.as_str()],
            )
            .await?;

        row.as_ref().map(decode).transpose()
    }

    async fn insert(&self, record: &DrawRecord) -> Result<StoredDraw, StoreError> {
        let client = self.client().await?;
        let result = client
            .query_one(
                &format!(
                    "INSERT INTO {} (type, draw_date, draw_time, result, fireball)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING id, type, draw_date, draw_time, result, fireball",
                    self.table
                ),
                &[
                    &record.game.as_str(),
                    &record.date,
                    &record.draw_time.as_str(),
                    &record.numbers,
                    &record.fireball_opt(),
                ],
            )
            .await;

        match result {
            Ok(row) => decode(&row),
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(StoreError::UniqueViolation(record.key().to_string()))
            }
            Err(e) => Err(StoreError::Postgres(e)),
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_one(&format!("SELECT COUNT(*) FROM {}", self.table), &[])
            .await?;
        let count: i64 = row.try_get(0)?;
        Ok(count as usize)
    }

    async fn recent(
        &self,
        game: Option<Game>,
        limit: usize,
    ) -> Result<Vec<StoredDraw>, StoreError> {
        let client = self.client().await?;
        let game = game.map(|g| g.as_str());
        let rows = client
            .query(
                &format!(
                    "SELECT id, type, draw_date, draw_time, result, fireball FROM {}
                     WHERE ($1::TEXT IS NULL OR type = $1)
                     ORDER BY draw_date DESC, draw_time ASC, id DESC
                     LIMIT $2",
                    self.table
                ),
                &[&game, &(limit as i64)],
            )
            .await?;

        rows.iter().map(decode).collect()
    }
}
