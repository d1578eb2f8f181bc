//! SQLite database connection and schema management
//!
//! Manages the board database (`~/.challenge-board/board.db` by default) with
//! automatic schema migration.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Shared handle to the board database
#[derive(Clone)]
pub struct StoreDb {
    conn: Arc<Mutex<Connection>>,
}

impl StoreDb {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open board db: {}", path.display()))?;

        // WAL lets the leaderboard reader run next to the sync writer
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Lock the connection. A panic in another holder leaves the connection
    /// itself usable, so poisoning is ignored.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to create board schema")?;
        drop(conn);
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .unwrap_or(0);

        // Migration 2: challenge titles for announcements
        if version < 2 {
            let has_title: bool = conn
                .prepare("SELECT COUNT(*) FROM pragma_table_info('challenges') WHERE name = 'title'")
                .and_then(|mut s| s.query_row([], |r| r.get::<_, i32>(0)))
                .map(|c| c > 0)
                .unwrap_or(false);

            if !has_title {
                conn.execute_batch("ALTER TABLE challenges ADD COLUMN title TEXT;")?;
            }
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        // Migration 3: indexes for the monthly and yearly board queries
        if version < 3 {
            conn.execute_batch(
                r#"
                CREATE INDEX IF NOT EXISTS idx_awards_year ON awards(year, month);
                CREATE INDEX IF NOT EXISTS idx_awards_period ON awards(game_id, year, month);
                "#,
            )?;
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (3)", [])?;
        }

        // Migration 4: evaluations deferred by bad progress data
        if version < 4 {
            let has_pending: bool = conn
                .prepare(
                    "SELECT COUNT(*) FROM pragma_table_info('player_progress') WHERE name = 'pending_evaluation'",
                )
                .and_then(|mut s| s.query_row([], |r| r.get::<_, i32>(0)))
                .map(|c| c > 0)
                .unwrap_or(false);

            if !has_pending {
                conn.execute_batch(
                    "ALTER TABLE player_progress ADD COLUMN pending_evaluation INTEGER NOT NULL DEFAULT 0;",
                )?;
            }
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (4)", [])?;
        }

        Ok(())
    }
}

/// SQL schema for the board database
const SCHEMA_SQL: &str = r#"
-- Registered users; username uniqueness ignores case
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY COLLATE NOCASE,
    active INTEGER NOT NULL DEFAULT 1,
    registered_at INTEGER NOT NULL
);

-- Challenge games per period
CREATE TABLE IF NOT EXISTS challenges (
    game_id TEXT NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    kind TEXT NOT NULL,
    total_achievements INTEGER NOT NULL DEFAULT 0,
    win_conditions TEXT NOT NULL DEFAULT '[]',
    progression TEXT NOT NULL DEFAULT '[]',
    require_all_win INTEGER NOT NULL DEFAULT 0,
    allows_mastery INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (game_id, month, year)
);

-- Awards. Usernames are stored as written; legacy rows may differ in case.
CREATE TABLE IF NOT EXISTS awards (
    username TEXT NOT NULL,
    game_id TEXT NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    tier INTEGER NOT NULL DEFAULT 0,
    achievement_count INTEGER NOT NULL DEFAULT 0,
    total_achievements INTEGER NOT NULL DEFAULT 0,
    completion_percent REAL NOT NULL DEFAULT 0.0,
    manual_reason TEXT,
    manual_grantor TEXT,
    manual_points INTEGER,
    revision INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (username, game_id, month, year)
);

-- Sync bookkeeping per (user, game)
CREATE TABLE IF NOT EXISTS player_progress (
    username TEXT NOT NULL,
    game_id TEXT NOT NULL,
    last_processed_at INTEGER NOT NULL DEFAULT 0,
    last_award_tier INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (username, game_id)
);

-- Append-only set of announced unlocks
CREATE TABLE IF NOT EXISTS announced_achievements (
    username TEXT NOT NULL,
    game_id TEXT NOT NULL,
    dedup_key TEXT NOT NULL,
    announced_at INTEGER NOT NULL,
    PRIMARY KEY (username, game_id, dedup_key)
);

-- Last computed leaderboard per scope
CREATE TABLE IF NOT EXISTS leaderboard_cache (
    scope TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    last_update INTEGER NOT NULL
);

-- Durable cursors (sync watermark)
CREATE TABLE IF NOT EXISTS sync_state (
    key TEXT PRIMARY KEY,
    value INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;
