//! Challenge game definitions as stored

use std::collections::BTreeSet;

use rusqlite::{params, Row};

use super::db::StoreDb;
use crate::domain::{ChallengeGame, ChallengeKind, Period};
use crate::error::SyncResult;

const CHALLENGE_COLUMNS: &str = "game_id, month, year, kind, total_achievements, win_conditions, \
     progression, require_all_win, allows_mastery, title";

/// Read access to challenges, plus the upsert used by the config importer
#[derive(Clone)]
pub struct ChallengeStore {
    db: StoreDb,
}

impl ChallengeStore {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    /// Insert or replace a challenge definition
    pub fn upsert(&self, game: &ChallengeGame) -> SyncResult<()> {
        let win = serde_json::to_string(&game.win_conditions)?;
        let progression = serde_json::to_string(&game.progression)?;
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO challenges
               (game_id, month, year, kind, total_achievements, win_conditions, progression,
                require_all_win, allows_mastery, title)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
               ON CONFLICT(game_id, month, year) DO UPDATE SET
                   kind = ?4, total_achievements = ?5, win_conditions = ?6, progression = ?7,
                   require_all_win = ?8, allows_mastery = ?9, title = ?10"#,
            params![
                game.game_id, game.period.month, game.period.year, game.kind.as_str(),
                game.total_achievements, win, progression,
                game.require_all_win_conditions as i32, game.allows_mastery as i32, game.title,
            ],
        )?;
        Ok(())
    }

    /// Every challenge game (monthly and shadow) running in a period
    pub fn active_for(&self, period: Period) -> SyncResult<Vec<ChallengeGame>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHALLENGE_COLUMNS} FROM challenges
             WHERE month = ?1 AND year = ?2 ORDER BY kind, game_id"
        ))?;
        let rows = stmt.query_map(params![period.month, period.year], challenge_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The monthly game for a period, if one is configured
    pub fn monthly_for(&self, period: Period) -> SyncResult<Option<ChallengeGame>> {
        Ok(self
            .active_for(period)?
            .into_iter()
            .find(|g| g.kind == ChallengeKind::Monthly))
    }
}

fn challenge_from_row(row: &Row<'_>) -> rusqlite::Result<ChallengeGame> {
    let kind_raw: String = row.get(3)?;
    let kind = ChallengeKind::from_str(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown challenge kind: {kind_raw}").into(),
        )
    })?;

    Ok(ChallengeGame {
        game_id: row.get(0)?,
        title: row.get(9)?,
        period: Period::new(row.get(1)?, row.get(2)?),
        kind,
        total_achievements: row.get(4)?,
        win_conditions: id_set(row, 5)?,
        progression: id_set(row, 6)?,
        require_all_win_conditions: row.get::<_, i32>(7)? != 0,
        allows_mastery: row.get::<_, i32>(8)? != 0,
    })
}

fn id_set(row: &Row<'_>, idx: usize) -> rusqlite::Result<BTreeSet<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(id: &str, kind: ChallengeKind) -> ChallengeGame {
        ChallengeGame {
            game_id: id.to_string(),
            title: Some(format!("Game {id}")),
            period: Period::new(4, 2025),
            kind,
            total_achievements: 50,
            win_conditions: ["A".to_string(), "B".to_string()].into(),
            progression: ["P1".to_string()].into(),
            require_all_win_conditions: false,
            allows_mastery: true,
        }
    }

    #[test]
    fn test_upsert_and_lookup() {
        let store = ChallengeStore::new(StoreDb::open_in_memory().unwrap());
        store.upsert(&game("10", ChallengeKind::Monthly)).unwrap();
        store.upsert(&game("20", ChallengeKind::Shadow)).unwrap();

        let mut changed = game("10", ChallengeKind::Monthly);
        changed.total_achievements = 55;
        store.upsert(&changed).unwrap();

        let active = store.active_for(Period::new(4, 2025)).unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active.iter().find(|g| g.game_id == "10"), Some(&changed));
        assert!(store.active_for(Period::new(5, 2025)).unwrap().is_empty());
        assert_eq!(
            store.monthly_for(Period::new(4, 2025)).unwrap().unwrap().game_id,
            "10"
        );
    }
}
