//! Idempotent ingestion of extracted draws
//!
//! Records are written one at a time. The existence check is only a fast
//! path; the store's unique key is the real gate, so two overlapping runs
//! that both miss the check still leave a single row per key, and the loser
//! counts its record as skipped.

pub mod pipeline;

use crate::metrics;
use crate::models::{DrawRecord, IngestStats};
use crate::storage::SharedDrawRepository;

pub use pipeline::RetrievalPipeline;

/// Ingestion behaviour
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Look up the natural key before inserting
    pub precheck: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { precheck: true }
    }
}

impl From<&crate::config::IngestConfig> for IngestOptions {
    fn from(config: &crate::config::IngestConfig) -> Self {
        Self {
            precheck: config.precheck,
        }
    }
}

/// Writes extracted records to the store exactly once
pub struct IngestionCoordinator {
    repository: SharedDrawRepository,
    options: IngestOptions,
}

enum Outcome {
    Stored,
    Skipped,
    Failed,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Stored => "stored",
            Outcome::Skipped => "skipped",
            Outcome::Failed => "failed",
        }
    }
}

impl IngestionCoordinator {
    pub fn new(repository: SharedDrawRepository, options: IngestOptions) -> Self {
        Self { repository, options }
    }

    pub fn repository(&self) -> &SharedDrawRepository {
        &self.repository
    }

    /// Ingest `records` in order
    ///
    /// Never fails as a whole: unexpected store errors are logged and
    /// counted in `failed` and the batch continues.
    pub async fn ingest(&self, records: &[DrawRecord]) -> IngestStats {
        let mut stats = IngestStats::default();

        for record in records {
            let outcome = self.ingest_one(record).await;
            metrics::record_ingest_outcome(outcome.as_str());
            match outcome {
                Outcome::Stored => stats.stored += 1,
                Outcome::Skipped => stats.skipped += 1,
                Outcome::Failed => stats.failed += 1,
            }
        }

        tracing::info!(
            stored = stats.stored,
            skipped = stats.skipped,
            failed = stats.failed,
            store = self.repository.name(),
            "Ingestion pass complete"
        );
        stats
    }

    async fn ingest_one(&self, record: &DrawRecord) -> Outcome {
        let key = record.key();

        if self.options.precheck {
            match self.repository.find(&key).await {
                Ok(Some(_)) => {
                    tracing::debug!(key = %key, "Already stored");
                    return Outcome::Skipped;
                }
                Ok(None) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    // The insert below still decides
                    tracing::warn!(
                        key = %key,
                        error = %e,
                        "Existence check failed, inserting anyway"
                    );
                }
            }
        }

        match self.repository.insert(record).await {
            Ok(_) => {
                tracing::info!(
                    game = %record.game,
                    draw_time = %record.draw_time,
                    date = %record.date,
                    numbers = %record.numbers,
                    "Stored draw"
                );
                Outcome::Stored
            }
            Err(e) if e.is_unique_violation() => {
                tracing::debug!(key = %key, "Insert lost to an existing row");
                Outcome::Skipped
            }
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to store draw");
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DrawKey, DrawTime, Game, StoredDraw};
    use crate::storage::{DrawRepository, MemoryDrawRepository};
    use crate::utils::error::StoreError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn record(time: DrawTime, day: u32, numbers: &str) -> DrawRecord {
        DrawRecord {
            game: Game::Pick3,
            draw_time: time,
            date: NaiveDate::from_ymd_opt(2025, 12, day).unwrap(),
            numbers: numbers.to_string(),
            fireball: String::new(),
        }
    }

    /// Lookup reports missing rows as NotFound errors; inserts fail for one key
    struct Quirky {
        inner: MemoryDrawRepository,
        finds: AtomicUsize,
        poisoned_numbers: &'static str,
    }

    #[async_trait]
    impl DrawRepository for Quirky {
        fn name(&self) -> &str {
            "quirky"
        }

        async fn find(&self, key: &DrawKey) -> Result<Option<StoredDraw>, StoreError> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            match self.inner.find(key).await? {
                Some(row) => Ok(Some(row)),
                None => Err(StoreError::NotFound(key.to_string())),
            }
        }

        async fn insert(&self, record: &DrawRecord) -> Result<StoredDraw, StoreError> {
            if record.numbers == self.poisoned_numbers {
                return Err(StoreError::Pool("connection reset".to_string()));
            }
            self.inner.insert(record).await
        }

        async fn count(&self) -> Result<usize, StoreError> {
            self.inner.count().await
        }

        async fn recent(
            &self,
            game: Option<Game>,
            limit: usize,
        ) -> Result<Vec<StoredDraw>, StoreError> {
            self.inner.recent(game, limit).await
        }
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() {
        let repo = Arc::new(MemoryDrawRepository::new());
        let coordinator = IngestionCoordinator::new(repo.clone(), IngestOptions::default());
        let batch = vec![
            record(DrawTime::Midday, 19, "123"),
            record(DrawTime::Evening, 19, "456"),
        ];

        let first = coordinator.ingest(&batch).await;
        assert_eq!((first.stored, first.skipped, first.failed), (2, 0, 0));

        let second = coordinator.ingest(&batch).await;
        assert_eq!((second.stored, second.skipped, second.failed), (0, 2, 0));

        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_inside_one_batch() {
        let repo = Arc::new(MemoryDrawRepository::new());
        let coordinator = IngestionCoordinator::new(repo, IngestOptions { precheck: false });
        let batch = vec![
            record(DrawTime::Midday, 19, "123"),
            record(DrawTime::Midday, 19, "123"),
        ];

        let stats = coordinator.ingest(&batch).await;
        assert_eq!((stats.stored, stats.skipped), (1, 1));
    }

    #[tokio::test]
    async fn test_not_found_error_and_failed_insert() {
        let repo = Arc::new(Quirky {
            inner: MemoryDrawRepository::new(),
            finds: AtomicUsize::new(0),
            poisoned_numbers: "999",
        });
        let coordinator = IngestionCoordinator::new(repo.clone(), IngestOptions::default());
        let batch = vec![
            record(DrawTime::Midday, 19, "123"),
            record(DrawTime::Evening, 19, "999"),
            record(DrawTime::Midday, 18, "321"),
        ];

        let stats = coordinator.ingest(&batch).await;
        assert_eq!(stats.stored, 2);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.processed(), 3);
        assert_eq!(repo.finds.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_precheck_disabled_skips_lookup() {
        let repo = Arc::new(Quirky {
            inner: MemoryDrawRepository::new(),
            finds: AtomicUsize::new(0),
            poisoned_numbers: "",
        });
        let coordinator =
            IngestionCoordinator::new(repo.clone(), IngestOptions { precheck: false });

        let stats = coordinator.ingest(&[record(DrawTime::Midday, 19, "123")]).await;
        assert_eq!(stats.stored, 1);
        assert_eq!(repo.finds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let coordinator = IngestionCoordinator::new(
            Arc::new(MemoryDrawRepository::new()),
            IngestOptions::default(),
        );
        assert_eq!(coordinator.ingest(&[]).await, IngestStats::default());
    }
}
