//! Core domain types for challenge-board

mod achievement;
mod award;
mod challenge;
mod leaderboard;
mod period;
mod progress;

pub use achievement::{GameProgress, UnlockedAchievement};
pub use award::{Award, AwardKey, AwardTier, ManualAward, MANUAL_GAME_PREFIX};
pub use challenge::{ChallengeGame, ChallengeKind};
pub use leaderboard::{EntryDetail, LeaderboardEntry, LeaderboardScope, LeaderboardSnapshot};
pub use period::{now_ms, Period};
pub use progress::{PlayerProgress, User};
