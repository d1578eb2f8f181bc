//! Durable global cursor for the sync driver

use rusqlite::{params, OptionalExtension};

use super::db::StoreDb;
use crate::domain::now_ms;
use crate::error::SyncResult;

const WATERMARK_KEY: &str = "achievement_watermark";

#[derive(Clone)]
pub struct SyncStateStore {
    db: StoreDb,
}

impl SyncStateStore {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    /// Start time of the last fully successful cycle
    pub fn watermark(&self) -> SyncResult<Option<i64>> {
        let conn = self.db.conn();
        let value = conn
            .query_row("SELECT value FROM sync_state WHERE key = ?1", [WATERMARK_KEY], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Persist a new watermark. Never moves the cursor backwards.
    pub fn advance_watermark(&self, watermark: i64) -> SyncResult<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO sync_state (key, value, updated_at) VALUES (?1, ?2, ?3)
               ON CONFLICT(key) DO UPDATE SET
                   value = MAX(value, excluded.value), updated_at = excluded.updated_at"#,
            params![WATERMARK_KEY, watermark, now_ms()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watermark_only_moves_forward() {
        let state = SyncStateStore::new(StoreDb::open_in_memory().unwrap());
        assert_eq!(state.watermark().unwrap(), None);

        state.advance_watermark(5_000).unwrap();
        state.advance_watermark(3_000).unwrap();
        assert_eq!(state.watermark().unwrap(), Some(5_000));

        state.advance_watermark(9_000).unwrap();
        assert_eq!(state.watermark().unwrap(), Some(9_000));
    }
}
