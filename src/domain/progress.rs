//! Registered users and per-game sync progress

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::award::AwardTier;

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Canonical spelling; unique case-insensitively
    pub username: String,
    pub active: bool,
}

/// Sync bookkeeping for one (user, game) pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub username: String,
    pub game_id: String,
    /// Newest unlock time processed for this pair (ms since epoch)
    pub last_processed_at: i64,
    /// Dedup keys of unlocks already announced; only ever grows
    pub announced: BTreeSet<String>,
    pub last_award_tier: AwardTier,
    /// Award evaluation was skipped on bad data and must be re-run
    pub pending_evaluation: bool,
}
