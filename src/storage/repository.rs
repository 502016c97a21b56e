//! Repository Pattern for the draw store
//!
//! Business logic talks to [`DrawRepository`]; backends decide where rows
//! live. Every backend enforces uniqueness of the natural key
//! `(type, draw_date, draw_time)` and reports a violation as
//! [`StoreError::UniqueViolation`], which ingestion treats as "already stored".
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  IngestionCoordinator                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DrawRepository                          │
//! └─────────────────────────────────────────────────────────────┘
//!          │                │                │              │
//!          ▼                ▼                ▼              ▼
//!      SQLite          PostgreSQL        PostgREST        Memory
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{DrawKey, DrawRecord, Game, StoredDraw};
use crate::utils::error::StoreError;

/// Shared repository handle
pub type SharedDrawRepository = Arc<dyn DrawRepository>;

// ============================================================================
// Repository Trait
// ============================================================================

/// Persistent table of draws keyed by `(game, date, draw time)`
#[async_trait]
pub trait DrawRepository: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Look up the row for `key`
    ///
    /// Backends return `Ok(None)` when no row exists. Some report that case
    /// as `Err(StoreError::NotFound)` instead; callers treat both the same.
    async fn find(&self, key: &DrawKey) -> Result<Option<StoredDraw>, StoreError>;

    /// Insert a new row; `Err(StoreError::UniqueViolation)` if the key exists
    async fn insert(&self, record: &DrawRecord) -> Result<StoredDraw, StoreError>;

    /// Number of stored rows
    async fn count(&self) -> Result<usize, StoreError>;

    /// Most recent rows, newest first (evening before midday on the same day)
    async fn recent(&self, game: Option<Game>, limit: usize)
        -> Result<Vec<StoredDraw>, StoreError>;
}

/// Decode raw column values into a stored draw
pub(crate) fn decode_row(
    id: i64,
    game: &str,
    draw_date: &str,
    draw_time: &str,
    numbers: String,
    fireball: Option<String>,
) -> Result<StoredDraw, StoreError> {
    let corrupt = |what: &str| StoreError::CorruptRow(format!("row {id}: {what}"));

    Ok(StoredDraw {
        id,
        game: game.parse().map_err(|_| corrupt(&format!("bad type {game:?}")))?,
        draw_time: draw_time
            .parse()
            .map_err(|_| corrupt(&format!("bad draw_time {draw_time:?}")))?,
        date: NaiveDate::parse_from_str(draw_date, "%Y-%m-%d")
            .map_err(|_| corrupt(&format!("bad draw_date {draw_date:?}")))?,
        numbers,
        fireball: fireball.filter(|f| !f.is_empty()),
    })
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of DrawRepository
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteDrawRepository {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteDrawRepository {
    /// Open (or create) the database at `path`
    pub fn new(path: impl AsRef<Path>, table: &str) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Pool(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL lets readers (the API) proceed while a scrape writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), table, "SQLite draw store initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let repo = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            table: String::from("games"),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let table = &self.table;
        conn.execute_batch(&format!(
            r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    type TEXT NOT NULL,
                    draw_date TEXT NOT NULL,
                    draw_time TEXT NOT NULL,
                    result TEXT NOT NULL,
                    fireball TEXT,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (type, draw_date, draw_time)
                );

                CREATE INDEX IF NOT EXISTS idx_{table}_draw_date
                    ON {table}(draw_date);
                "#
        ))?;
        Ok(())
    }
}

/// Map SQLite constraint failures on the natural key to `UniqueViolation`
fn map_insert_error(err: rusqlite::Error, key: &DrawKey) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return StoreError::UniqueViolation(key.to_string());
        }
    }
    StoreError::Sqlite(err)
}

type RawRow = (i64, String, String, String, String, Option<String>);

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode_raw((id, game, date, time, numbers, fireball): RawRow) -> Result<StoredDraw, StoreError> {
    decode_row(id, &game, &date, &time, numbers, fireball)
}

#[async_trait]
impl DrawRepository for SqliteDrawRepository {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn find(&self, key: &DrawKey) -> Result<Option<StoredDraw>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT id, type, draw_date, draw_time, result, fireball FROM {}
                     WHERE type = ?1 AND draw_date = ?2 AND draw_time = ?3",
                    self.table
                ),
                params![
                    key.game.as_str(),
                    key.date.format("%Y-%m-%d").to_string(),
                    key.draw_time.as_str()
                ],
                raw_row,
            )
            .optional()?;

        row.map(decode_raw).transpose()
    }

    async fn insert(&self, record: &DrawRecord) -> Result<StoredDraw, StoreError> {
        let key = record.key();
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (type, draw_date, draw_time, result, fireball)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                self.table
            ),
            params![
                record.game.as_str(),
                record.date.format("%Y-%m-%d").to_string(),
                record.draw_time.as_str(),
                record.numbers,
                record.fireball_opt()
            ],
        )
        .map_err(|e| map_insert_error(e, &key))?;

        Ok(StoredDraw {
            id: conn.last_insert_rowid(),
            game: record.game,
            draw_time: record.draw_time,
            date: record.date,
            numbers: record.numbers.clone(),
            fireball: record.fireball_opt().map(str::to_string),
        })
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
                row.get(0)
            })?;
        Ok(count as usize)
    }

    async fn recent(
        &self,
        game: Option<Game>,
        limit: usize,
    ) -> Result<Vec<StoredDraw>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, type, draw_date, draw_time, result, fireball FROM {}
             WHERE (?1 IS NULL OR type = ?1)
             ORDER BY draw_date DESC, draw_time ASC, id DESC
             LIMIT ?2",
            self.table
        ))?;

        let rows = stmt
            .query_map(params![game.map(|g| g.as_str()), limit as i64], raw_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(decode_raw).collect()
    }
}

// ============================================================================
// In-memory Implementation
// ============================================================================

/// In-memory DrawRepository enforcing the same key uniqueness
///
/// Used for tests and for `extract`-style dry runs.
#[derive(Default)]
pub struct MemoryDrawRepository {
    rows: RwLock<Vec<StoredDraw>>,
}

impl MemoryDrawRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all rows in insertion order
    pub fn rows(&self) -> Vec<StoredDraw> {
        self.rows.read().map(|rows| rows.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DrawRepository for MemoryDrawRepository {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find(&self, key: &DrawKey) -> Result<Option<StoredDraw>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.iter().find(|row| row.key() == *key).cloned())
    }

    async fn insert(&self, record: &DrawRecord) -> Result<StoredDraw, StoreError> {
        let key = record.key();
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;

        if rows.iter().any(|row| row.key() == key) {
            return Err(StoreError::UniqueViolation(key.to_string()));
        }

        let stored = StoredDraw {
            id: rows.len() as i64 + 1,
            game: record.game,
            draw_time: record.draw_time,
            date: record.date,
            numbers: record.numbers.clone(),
            fireball: record.fireball_opt().map(str::to_string),
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.rows.read().map_err(|_| StoreError::Poisoned)?.len())
    }

    async fn recent(
        &self,
        game: Option<Game>,
        limit: usize,
    ) -> Result<Vec<StoredDraw>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        let mut selected: Vec<StoredDraw> = rows
            .iter()
            .filter(|row| game.map_or(true, |g| row.game == g))
            .cloned()
            .collect();

        selected.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.draw_time.as_str().cmp(b.draw_time.as_str()))
                .then_with(|| b.id.cmp(&a.id))
        });
        selected.truncate(limit);
        Ok(selected)
    }
}
