//! SQLite Database
//!
//! Embedded database for completed survey rows using rusqlite with r2d2 connection pooling.

use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{database_path, ensure_parent_dir};

/// Raw survey response row from the database
#[derive(Debug, Clone)]
pub struct SurveyResponseRow {
    pub id: String,
    pub session_id: String,
    /// JSON array: reactions in topic order, then scores in dimension order
    pub row_json: String,
    pub created_at: Option<String>,
}

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database service for managing SQLite operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a database from an existing connection pool.
    pub fn from_pool(pool: DbPool) -> AppResult<Self> {
        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database for testing.
    ///
    /// Uses an in-memory SQLite database with the same schema as the
    /// production database.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        Self::from_pool(pool)
    }

    /// Open the database at ~/.esg-survey/data.db
    pub fn new() -> AppResult<Self> {
        Self::open(&database_path()?)
    }

    /// Open (or create) a database file with connection pooling
    pub fn open(db_path: &Path) -> AppResult<Self> {
        ensure_parent_dir(db_path)?;

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        Self::from_pool(pool)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS survey_responses (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                row_json TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_survey_responses_session
             ON survey_responses(session_id)",
            [],
        )?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    /// Get the connection pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }

    // ========================================================================
    // Survey Response Operations
    // ========================================================================

    /// Insert one completed survey row
    pub fn insert_survey_response(
        &self,
        id: &str,
        session_id: &str,
        row_json: &str,
        created_at: &str,
    ) -> AppResult<()> {
        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO survey_responses (id, session_id, row_json, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, session_id, row_json, created_at],
        )?;
        Ok(())
    }

    /// All rows, oldest first
    pub fn list_survey_responses(&self) -> AppResult<Vec<SurveyResponseRow>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, row_json, created_at
             FROM survey_responses ORDER BY created_at, rowid",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_survey_response)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Rows written by one session
    pub fn get_survey_responses_for_session(
        &self,
        session_id: &str,
    ) -> AppResult<Vec<SurveyResponseRow>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, row_json, created_at
             FROM survey_responses WHERE session_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![session_id], Self::row_to_survey_response)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of stored rows
    pub fn count_survey_responses(&self) -> AppResult<usize> {
        let conn = self.get_connection()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM survey_responses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_survey_response(row: &rusqlite::Row) -> rusqlite::Result<SurveyResponseRow> {
        Ok(SurveyResponseRow {
            id: row.get(0)?,
            session_id: row.get(1)?,
            row_json: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("pool_size", &self.pool.state().connections)
            .finish()
    }
}
