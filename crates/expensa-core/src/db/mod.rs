//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `transactions` - Expense CRUD
//! - `analytics` - Totals, per-category and per-day aggregation over date ranges
//! - `settings` - Key-value settings, currency and budget
//! - `categories` - Custom and recently-used categories

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;

mod analytics;
mod categories;
mod settings;
mod transactions;

pub use analytics::DEFAULT_TOP_DAYS;
pub use settings::keys;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Format a timestamp for the `createdAt` / `created_at` columns
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time at the precision stored in the database
pub(crate) fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Parse a stored timestamp into a DateTime<Utc>
pub(crate) fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Rows written by SQLite's CURRENT_TIMESTAMP
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
}

/// Read a timestamp column, failing the row when the stored text is unreadable
pub(crate) fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| {
        debug!("Unreadable timestamp {:?} in column {}", raw, idx);
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl Database {
    /// Open (creating if needed) the database described by `config` and migrate it
    pub fn open(config: &Config) -> Result<Self> {
        if config.is_in_memory() {
            return Self::in_memory();
        }
        if let Some(dir) = config.database_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        Self::new_with_options(
            &config.database_path,
            config.pool_size,
            Duration::from_millis(config.busy_timeout_ms),
        )
    }

    /// Open a database file with a single pooled connection
    pub fn new(path: &Path) -> Result<Self> {
        Self::new_with_options(path, 1, Duration::from_secs(5))
    }

    fn new_with_options(path: &Path, pool_size: u32, busy_timeout: Duration) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch(
                r#"
                PRAGMA foreign_keys = ON;
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                "#,
            )?;
            Ok(())
        });
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string_lossy().to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Create an in-memory database (for testing and previews)
    ///
    /// Holds exactly one connection that is never recycled, since every new
    /// `:memory:` connection would be a separate empty database.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;

        let db = Self {
            pool,
            db_path: crate::config::IN_MEMORY_PATH.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Create tables and bring older layouts up to date. Safe to run repeatedly.
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Expenses. `date` is the user-assigned YYYY-MM-DD expense date,
            -- `createdAt` the insertion timestamp.
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                item TEXT,
                note TEXT,
                attachmentUri TEXT,
                date TEXT NOT NULL,
                createdAt TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT
            );

            CREATE TABLE IF NOT EXISTS custom_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        // Databases created before attachments existed lack the column
        if !column_exists(&conn, "transactions", "attachmentUri")? {
            conn.execute("ALTER TABLE transactions ADD COLUMN attachmentUri TEXT", [])?;
            info!("Added attachmentUri column to transactions");
        }

        conn.execute_batch(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category);
            "#,
        )?;

        debug!("Database schema initialized at {}", self.db_path);
        Ok(())
    }
}

/// Check a table's columns through `pragma_table_info`
pub(crate) fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        params![table, column],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
