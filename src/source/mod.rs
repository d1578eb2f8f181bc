//! Achievement service access
//!
//! [`AchievementSource`] is the seam between the sync driver and the external
//! achievement-tracking service. [`HttpAchievementSource`] talks to a
//! RetroAchievements-style web API; payloads go through [`shapes`] which maps
//! every known response layout onto the canonical domain records.

mod http;
pub mod shapes;

pub use http::HttpAchievementSource;

use async_trait::async_trait;

use crate::domain::{GameProgress, UnlockedAchievement};
use crate::error::SyncResult;

/// Supplier of unlock events and per-game progress
#[async_trait]
pub trait AchievementSource: Send + Sync {
    /// Recent unlocks for a user, newest window of `lookback_minutes`.
    ///
    /// Records that fail to normalize are dropped individually; a response
    /// that matches no known layout is a `MalformedPayload` error.
    async fn recent_achievements(
        &self,
        username: &str,
        lookback_minutes: u32,
    ) -> SyncResult<Vec<UnlockedAchievement>>;

    /// Progress summary for one user in one game
    async fn game_progress(&self, username: &str, game_id: &str) -> SyncResult<GameProgress>;
}
