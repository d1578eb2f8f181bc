//! Per (user, game) sync bookkeeping: watermark, announced set, last tier,
//! deferred evaluations

use std::collections::BTreeSet;

use rusqlite::{params, OptionalExtension};

use super::db::StoreDb;
use crate::domain::{now_ms, AwardTier, PlayerProgress};
use crate::error::SyncResult;

/// Read/write access to `player_progress` and `announced_achievements`
#[derive(Clone)]
pub struct ProgressStore {
    db: StoreDb,
}

impl ProgressStore {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    /// Load the full progress record, if the pair was ever seen
    pub fn get(&self, username: &str, game_id: &str) -> SyncResult<Option<PlayerProgress>> {
        let conn = self.db.conn();
        let head = conn
            .query_row(
                "SELECT last_processed_at, last_award_tier, pending_evaluation FROM player_progress
                 WHERE username = ?1 AND game_id = ?2",
                params![username, game_id],
                |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?, r.get::<_, bool>(2)?)),
            )
            .optional()?;

        let Some((last_processed_at, tier_raw, pending_evaluation)) = head else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT dedup_key FROM announced_achievements WHERE username = ?1 AND game_id = ?2",
        )?;
        let announced: BTreeSet<String> = stmt
            .query_map(params![username, game_id], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        Ok(Some(PlayerProgress {
            username: username.to_string(),
            game_id: game_id.to_string(),
            last_processed_at,
            announced,
            last_award_tier: AwardTier::from_i64(tier_raw).unwrap_or_default(),
            pending_evaluation,
        }))
    }

    /// Whether this unlock was already announced for the pair
    pub fn is_announced(&self, username: &str, game_id: &str, dedup_key: &str) -> SyncResult<bool> {
        let conn = self.db.conn();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM announced_achievements
                 WHERE username = ?1 AND game_id = ?2 AND dedup_key = ?3",
                params![username, game_id, dedup_key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Append the dedup key and advance the pair's watermark in one transaction.
    ///
    /// The watermark and tier only move forward; replaying an older unlock
    /// leaves them where they are.
    pub fn record_processed(
        &self,
        username: &str,
        game_id: &str,
        dedup_key: &str,
        unlocked_at: i64,
        tier: Option<AwardTier>,
    ) -> SyncResult<()> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO announced_achievements (username, game_id, dedup_key, announced_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, game_id, dedup_key, now_ms()],
        )?;
        let tier = tier.unwrap_or_default().as_i64();
        tx.execute(
            r#"INSERT INTO player_progress (username, game_id, last_processed_at, last_award_tier)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(username, game_id) DO UPDATE SET
                   last_processed_at = MAX(last_processed_at, excluded.last_processed_at),
                   last_award_tier = MAX(last_award_tier, excluded.last_award_tier)"#,
            params![username, game_id, unlocked_at, tier],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Flag or clear a deferred award evaluation for the pair
    pub fn set_pending(&self, username: &str, game_id: &str, pending: bool) -> SyncResult<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO player_progress (username, game_id, pending_evaluation)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(username, game_id) DO UPDATE SET
                   pending_evaluation = excluded.pending_evaluation"#,
            params![username, game_id, pending],
        )?;
        Ok(())
    }

    /// Games with a deferred evaluation for `username`
    pub fn pending_games(&self, username: &str) -> SyncResult<BTreeSet<String>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT game_id FROM player_progress WHERE username = ?1 AND pending_evaluation = 1",
        )?;
        let games = stmt
            .query_map([username], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(games)
    }
}
