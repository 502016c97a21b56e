//! Draw persistence
//!
//! This module provides the [`DrawRepository`] abstraction and its SQLite,
//! PostgreSQL, PostgREST and in-memory backends.

pub mod postgres;
pub mod postgrest;
pub mod repository;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::{DatabaseConfig, StoreBackend};

pub use postgres::PostgresDrawRepository;
pub use postgrest::PostgrestDrawRepository;
pub use repository::{
    DrawRepository, MemoryDrawRepository, SharedDrawRepository, SqliteDrawRepository,
};

/// Build the repository selected by configuration
pub async fn connect(config: &DatabaseConfig) -> Result<SharedDrawRepository> {
    let repo: SharedDrawRepository = match config.backend {
        StoreBackend::Sqlite => Arc::new(
            SqliteDrawRepository::new(&config.sqlite_path, &config.table).with_context(|| {
                format!("Failed to open SQLite store at {}", config.sqlite_path.display())
            })?,
        ),
        StoreBackend::Postgres => Arc::new(
            PostgresDrawRepository::connect(&config.postgres_url, config.pool_size, &config.table)
                .await
                .context("Failed to connect to PostgreSQL store")?,
        ),
        StoreBackend::Postgrest => Arc::new(
            PostgrestDrawRepository::new(
                &config.postgrest_url,
                config.postgrest_key.as_deref(),
                &config.table,
            )
            .context("Failed to create PostgREST store client")?,
        ),
    };

    tracing::debug!(backend = repo.name(), "Draw store ready");
    Ok(repo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            sqlite_path: dir.path().join("draws.db"),
            ..Default::default()
        };

        let repo = connect(&config).await.unwrap();
        assert_eq!(repo.name(), "sqlite");
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_postgrest() {
        let config = DatabaseConfig {
            backend: StoreBackend::Postgrest,
            postgrest_url: "https://example.supabase.co".to_string(),
            ..Default::default()
        };

        let repo = connect(&config).await.unwrap();
        assert_eq!(repo.name(), "postgrest");
    }
}
