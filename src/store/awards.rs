//! Award records
//!
//! Every write is conditional on the revision the caller read, so two
//! writers racing on one key cannot both succeed and a tier can never be
//! lowered. Deciding *what* to write is the award engine's job.

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::db::StoreDb;
use crate::domain::{now_ms, Award, AwardKey, AwardTier, ManualAward, Period, MANUAL_GAME_PREFIX};
use crate::error::{SyncError, SyncResult};

/// An award together with the revision it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAward {
    pub award: Award,
    pub revision: i64,
}

/// Values written for a challenge award
#[derive(Debug, Clone, PartialEq)]
pub struct AwardUpdate {
    pub tier: AwardTier,
    pub achievement_count: u32,
    pub total_achievements: u32,
    pub completion_percent: f64,
}

const AWARD_COLUMNS: &str = "username, game_id, month, year, tier, achievement_count, \
     total_achievements, completion_percent, manual_reason, manual_grantor, manual_points, revision";

/// Read/write access to the `awards` table
#[derive(Clone)]
pub struct AwardStore {
    db: StoreDb,
}

impl AwardStore {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    /// Read one award by exact key
    pub fn get(&self, key: &AwardKey) -> SyncResult<Option<StoredAward>> {
        let conn = self.db.conn();
        Ok(Self::read(&conn, key)?)
    }

    fn read(conn: &Connection, key: &AwardKey) -> rusqlite::Result<Option<StoredAward>> {
        conn.query_row(
            &format!(
                "SELECT {AWARD_COLUMNS} FROM awards
                 WHERE username = ?1 AND game_id = ?2 AND month = ?3 AND year = ?4"
            ),
            params![key.username, key.game_id, key.period.month, key.period.year],
            stored_award_from_row,
        )
        .optional()
    }

    /// Write `update` if the row is still at `expected_revision`.
    ///
    /// `None` means the caller saw no row and wants to create it. Fails with
    /// `ConcurrentUpdateConflict` when someone else wrote in between and with
    /// `TierRegression` when the stored tier is above `update.tier`.
    pub fn write_if_revision(
        &self,
        key: &AwardKey,
        update: &AwardUpdate,
        expected_revision: Option<i64>,
    ) -> SyncResult<i64> {
        let conn = self.db.conn();
        let now = now_ms();

        let changed = match expected_revision {
            None => conn.execute(
                r#"INSERT INTO awards
                   (username, game_id, month, year, tier, achievement_count,
                    total_achievements, completion_percent, revision, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)
                   ON CONFLICT(username, game_id, month, year) DO NOTHING"#,
                params![
                    key.username, key.game_id, key.period.month, key.period.year,
                    update.tier.as_i64(), update.achievement_count, update.total_achievements,
                    update.completion_percent, now,
                ],
            )?,
            Some(revision) => conn.execute(
                r#"UPDATE awards SET
                       tier = ?5, achievement_count = ?6, total_achievements = ?7,
                       completion_percent = ?8, revision = revision + 1, updated_at = ?9
                   WHERE username = ?1 AND game_id = ?2 AND month = ?3 AND year = ?4
                     AND revision = ?10 AND tier <= ?5"#,
                params![
                    key.username, key.game_id, key.period.month, key.period.year,
                    update.tier.as_i64(), update.achievement_count, update.total_achievements,
                    update.completion_percent, now, revision,
                ],
            )?,
        };

        if changed == 1 {
            return Ok(expected_revision.map_or(1, |r| r + 1));
        }

        // Nothing written: work out why
        match Self::read(&conn, key)? {
            Some(stored) if stored.award.tier > update.tier => Err(SyncError::TierRegression {
                key: key.to_string(),
                stored: stored.award.tier,
                requested: update.tier,
            }),
            _ => Err(SyncError::ConcurrentUpdateConflict(key.to_string())),
        }
    }

    /// All awards for one game in one period, in storage order
    pub fn list_for_game(&self, game_id: &str, period: Period) -> SyncResult<Vec<Award>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {AWARD_COLUMNS} FROM awards
             WHERE game_id = ?1 AND month = ?2 AND year = ?3
             ORDER BY username"
        ))?;
        let rows = stmt.query_map(params![game_id, period.month, period.year], |row| {
            stored_award_from_row(row).map(|s| s.award)
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// All awards (challenge and manual) in a year
    pub fn list_for_year(&self, year: i32) -> SyncResult<Vec<Award>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {AWARD_COLUMNS} FROM awards WHERE year = ?1 ORDER BY username, month, game_id"
        ))?;
        let rows = stmt.query_map([year], |row| stored_award_from_row(row).map(|s| s.award))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Record a manual point grant as its own award row
    pub fn insert_manual(
        &self,
        username: &str,
        period: Period,
        manual: &ManualAward,
    ) -> SyncResult<Award> {
        let game_id = format!("{}{}", MANUAL_GAME_PREFIX, Uuid::new_v4());
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO awards
               (username, game_id, month, year, tier, manual_reason, manual_grantor,
                manual_points, revision, updated_at)
               VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, 1, ?8)"#,
            params![
                username, game_id, period.month, period.year,
                manual.reason, manual.grantor, manual.points, now_ms(),
            ],
        )?;

        Ok(Award {
            username: username.to_string(),
            game_id,
            period,
            tier: AwardTier::None,
            achievement_count: 0,
            total_achievements: 0,
            completion_percent: 0.0,
            manual: Some(manual.clone()),
        })
    }

    /// Administrative correction: delete one award row.
    ///
    /// This is the only path that can take a tier away.
    pub fn remove(&self, key: &AwardKey) -> SyncResult<bool> {
        let conn = self.db.conn();
        let changed = conn.execute(
            "DELETE FROM awards WHERE username = ?1 AND game_id = ?2 AND month = ?3 AND year = ?4",
            params![key.username, key.game_id, key.period.month, key.period.year],
        )?;
        Ok(changed > 0)
    }
}

fn stored_award_from_row(row: &Row<'_>) -> rusqlite::Result<StoredAward> {
    let tier_raw: i64 = row.get(4)?;
    let tier =
        AwardTier::from_i64(tier_raw).ok_or(rusqlite::Error::IntegralValueOutOfRange(4, tier_raw))?;

    let manual_reason: Option<String> = row.get(8)?;
    let manual_grantor: Option<String> = row.get(9)?;
    let manual_points: Option<i64> = row.get(10)?;
    let manual = manual_points.map(|points| ManualAward {
        reason: manual_reason.unwrap_or_default(),
        grantor: manual_grantor.unwrap_or_default(),
        points,
    });

    Ok(StoredAward {
        award: Award {
            username: row.get(0)?,
            game_id: row.get(1)?,
            period: Period::new(row.get(2)?, row.get(3)?),
            tier,
            achievement_count: row.get(5)?,
            total_achievements: row.get(6)?,
            completion_percent: row.get(7)?,
            manual,
        },
        revision: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AwardStore {
        AwardStore::new(StoreDb::open_in_memory().unwrap())
    }

    fn update(tier: AwardTier, count: u32) -> AwardUpdate {
        AwardUpdate {
            tier,
            achievement_count: count,
            total_achievements: 50,
            completion_percent: count as f64 * 2.0,
        }
    }

    #[test]
    fn test_create_then_upgrade() {
        let awards = store();
        let key = AwardKey::new("Alice", "1234", Period::new(3, 2025));

        let rev = awards
            .write_if_revision(&key, &update(AwardTier::Participation, 5), None)
            .unwrap();
        assert_eq!(rev, 1);

        let rev = awards
            .write_if_revision(&key, &update(AwardTier::Beaten, 40), Some(rev))
            .unwrap();
        assert_eq!(rev, 2);

        let stored = awards.get(&key).unwrap().unwrap();
        assert_eq!(stored.award.tier, AwardTier::Beaten);
        assert_eq!(stored.award.achievement_count, 40);
        assert_eq!(stored.revision, 2);
    }

    #[test]
    fn test_stale_revision_is_conflict() {
        let awards = store();
        let key = AwardKey::new("Alice", "1234", Period::new(3, 2025));
        awards
            .write_if_revision(&key, &update(AwardTier::Participation, 5), None)
            .unwrap();

        // Second creator lost the race
        let err = awards
            .write_if_revision(&key, &update(AwardTier::Participation, 6), None)
            .unwrap_err();
        assert!(matches!(err, SyncError::ConcurrentUpdateConflict(_)));

        let err = awards
            .write_if_revision(&key, &update(AwardTier::Beaten, 30), Some(99))
            .unwrap_err();
        assert!(matches!(err, SyncError::ConcurrentUpdateConflict(_)));
    }

    #[test]
    fn test_lowering_tier_is_rejected() {
        let awards = store();
        let key = AwardKey::new("Alice", "1234", Period::new(3, 2025));
        let rev = awards
            .write_if_revision(&key, &update(AwardTier::Mastered, 50), None)
            .unwrap();

        let err = awards
            .write_if_revision(&key, &update(AwardTier::Beaten, 50), Some(rev))
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::TierRegression {
                stored: AwardTier::Mastered,
                requested: AwardTier::Beaten,
                ..
            }
        ));
        assert_eq!(awards.get(&key).unwrap().unwrap().award.tier, AwardTier::Mastered);
    }

    #[test]
    fn test_manual_awards_are_distinct_rows() {
        let awards = store();
        let period = Period::new(6, 2025);
        let grant = ManualAward {
            reason: "Community event".to_string(),
            grantor: "admin".to_string(),
            points: 2,
        };
        let a = awards.insert_manual("Alice", period, &grant).unwrap();
        let b = awards.insert_manual("Alice", period, &grant).unwrap();
        assert_ne!(a.game_id, b.game_id);
        assert!(a.is_manual());

        let rows = awards.list_for_year(2025).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.manual.as_ref().map(|m| m.points) == Some(2)));

        assert!(awards.remove(&a.key()).unwrap());
        assert_eq!(awards.list_for_year(2025).unwrap().len(), 1);
    }
}
