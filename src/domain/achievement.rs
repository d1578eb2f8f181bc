//! Records supplied by the external achievement service, after normalization

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One achievement unlock reported by the achievement service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub achievement_id: String,
    pub game_id: String,
    /// Unlock time, ms since epoch
    pub unlocked_at: i64,
    pub title: Option<String>,
    pub game_title: Option<String>,
}

impl UnlockedAchievement {
    /// Key used to remember that this unlock was already announced.
    ///
    /// Includes the unlock time so a reset-and-re-earn counts as a new event.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}:{}", self.achievement_id, self.game_id, self.unlocked_at)
    }
}

/// A user's progress summary for one game
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameProgress {
    pub earned_count: u32,
    pub total_count: u32,
    pub completion_percent: f64,
    pub earned_achievement_ids: BTreeSet<String>,
}

impl GameProgress {
    /// Fully completed, tolerating source-side rounding of the percentage
    pub fn is_complete(&self) -> bool {
        (self.total_count > 0 && self.earned_count >= self.total_count)
            || self.completion_percent >= 100.0
    }

    pub fn has_earned(&self, achievement_id: &str) -> bool {
        self.earned_achievement_ids.contains(achievement_id)
    }
}
