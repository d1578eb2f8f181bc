//! Durable snapshot store for computed leaderboards

use rusqlite::{params, OptionalExtension};

use super::db::StoreDb;
use crate::domain::{LeaderboardScope, LeaderboardSnapshot};
use crate::error::SyncResult;

/// One complete snapshot per scope; writes replace, reads never see halves
#[derive(Clone)]
pub struct LeaderboardCache {
    db: StoreDb,
}

impl LeaderboardCache {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    /// Replace the snapshot for its scope
    pub fn write(&self, snapshot: &LeaderboardSnapshot) -> SyncResult<()> {
        let payload = serde_json::to_string(snapshot)?;
        let conn = self.db.conn();
        conn.execute(
            "INSERT OR REPLACE INTO leaderboard_cache (scope, payload, last_update) VALUES (?1, ?2, ?3)",
            params![snapshot.scope.as_str(), payload, snapshot.last_update],
        )?;
        Ok(())
    }

    /// Last snapshot written for the scope, or None if never computed
    pub fn read(&self, scope: LeaderboardScope) -> SyncResult<Option<LeaderboardSnapshot>> {
        let conn = self.db.conn();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM leaderboard_cache WHERE scope = ?1",
                [scope.as_str()],
                |r| r.get(0),
            )
            .optional()?;
        drop(conn);

        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}
