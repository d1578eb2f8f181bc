//! Registered users

use rusqlite::{params, OptionalExtension};

use super::db::StoreDb;
use crate::domain::{now_ms, User};
use crate::error::SyncResult;
use crate::identity::IdentityResolver;

/// Read access to registered users, plus the registration hook used by tooling
#[derive(Clone)]
pub struct UserStore {
    db: StoreDb,
}

impl UserStore {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    /// Register a user, returning the canonical spelling.
    ///
    /// Registering a case variant of an existing name returns the existing name.
    pub fn register(&self, username: &str) -> SyncResult<String> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT OR IGNORE INTO users (username, active, registered_at) VALUES (?1, 1, ?2)",
            params![username.trim(), now_ms()],
        )?;
        let canonical: String = conn.query_row(
            "SELECT username FROM users WHERE username = ?1",
            [username.trim()],
            |r| r.get(0),
        )?;
        Ok(canonical)
    }

    pub fn set_active(&self, username: &str, active: bool) -> SyncResult<bool> {
        let conn = self.db.conn();
        let changed = conn.execute(
            "UPDATE users SET active = ?2 WHERE username = ?1",
            params![username, active as i32],
        )?;
        Ok(changed > 0)
    }

    /// Active users in a stable (case-insensitive) order
    pub fn active_users(&self) -> SyncResult<Vec<User>> {
        let conn = self.db.conn();
        let mut stmt =
            conn.prepare("SELECT username FROM users WHERE active = 1 ORDER BY username")?;
        let rows = stmt.query_map([], |r| {
            Ok(User {
                username: r.get(0)?,
                active: true,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Case-insensitive lookup of the canonical spelling
    pub fn canonical_name(&self, raw: &str) -> SyncResult<Option<String>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let conn = self.db.conn();
        let found = conn
            .query_row("SELECT username FROM users WHERE username = ?1", [trimmed], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(found)
    }
}

impl IdentityResolver for UserStore {
    fn resolve(&self, raw_username: &str) -> SyncResult<Option<String>> {
        self.canonical_name(raw_username)
    }
}
