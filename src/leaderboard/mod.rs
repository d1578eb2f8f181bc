//! Leaderboard computation
//!
//! Boards are pure functions of the award records; [`LeaderboardAggregator`]
//! reads the records, ranks them and replaces the cached snapshot.

mod monthly;
mod ranking;
mod yearly;

pub use monthly::monthly_entries;
pub use ranking::competition_ranks;
pub use yearly::yearly_entries;

use tracing::info;

use crate::config::PointTable;
use crate::domain::{LeaderboardScope, LeaderboardSnapshot, Period};
use crate::error::SyncResult;
use crate::store::Store;

#[derive(Clone)]
pub struct LeaderboardAggregator {
    store: Store,
    points: PointTable,
    top_slice: u32,
}

impl LeaderboardAggregator {
    pub fn new(store: Store, points: PointTable, top_slice: u32) -> Self {
        Self {
            store,
            points,
            top_slice,
        }
    }

    /// Compute a board for the period containing `now_ms` without caching it
    pub fn compute(&self, scope: LeaderboardScope, now_ms: i64) -> SyncResult<LeaderboardSnapshot> {
        let period = Period::from_timestamp_ms(now_ms);
        let users = self.store.users();

        let (label, game_id, entries) = match scope {
            LeaderboardScope::Monthly => match self.store.challenges().monthly_for(period)? {
                Some(game) => {
                    let awards = self.store.awards().list_for_game(&game.game_id, period)?;
                    let entries = monthly_entries(&awards, &users)?;
                    (period.label(), Some(game.game_id), entries)
                }
                // No monthly game configured yet
                None => (period.label(), None, Vec::new()),
            },
            LeaderboardScope::Yearly => {
                let awards = self.store.awards().list_for_year(period.year)?;
                let active = users.active_users()?;
                let entries = yearly_entries(&awards, &active, &users, &self.points)?;
                (period.year.to_string(), None, entries)
            }
        };

        Ok(LeaderboardSnapshot {
            scope,
            label,
            game_id,
            entries,
            top_slice: self.top_slice,
            last_update: now_ms,
        })
    }

    /// Compute and replace the cached snapshot for `scope`
    pub fn recompute(&self, scope: LeaderboardScope, now_ms: i64) -> SyncResult<LeaderboardSnapshot> {
        let snapshot = self.compute(scope, now_ms)?;
        self.store.cache().write(&snapshot)?;
        info!(scope = %scope, label = %snapshot.label, entries = snapshot.entries.len(), "Leaderboard updated");
        Ok(snapshot)
    }

    /// Recompute both boards
    pub fn recompute_all(&self, now_ms: i64) -> SyncResult<Vec<LeaderboardSnapshot>> {
        [LeaderboardScope::Monthly, LeaderboardScope::Yearly]
            .into_iter()
            .map(|scope| self.recompute(scope, now_ms))
            .collect()
    }

    /// Last cached snapshot, if any
    pub fn cached(&self, scope: LeaderboardScope) -> SyncResult<Option<LeaderboardSnapshot>> {
        self.store.cache().read(scope)
    }
}
