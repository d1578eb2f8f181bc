//! Challenge Board - challenge awards and leaderboards from achievement unlocks
//!
//! A periodic driver polls an external achievement service for every
//! registered user, turns new unlocks in challenge games into award tiers that
//! only ever move up, and announces unlocks and upgrades. Leaderboards are
//! computed from the stored awards and cached per scope.
//!
//! ## Flow
//!
//! 1. [`sync::SyncDriver`] walks the active users, throttled by a
//!    [`sync::RateLimiter`], and fetches recent unlocks from an
//!    [`source::AchievementSource`].
//! 2. New unlocks in an active challenge game run through the
//!    [`awards::AwardEngine`], which stores the tier with an optimistic,
//!    revision-checked write.
//! 3. [`announce::AnnouncementSink`] hears about unlocks and tier upgrades.
//! 4. [`leaderboard::LeaderboardAggregator`] merges case-variant usernames
//!    through an [`identity::IdentityResolver`], ranks, and writes the
//!    snapshot to the [`store::LeaderboardCache`].

pub mod announce;
pub mod awards;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod leaderboard;
pub mod source;
pub mod store;
pub mod sync;

pub use error::{SyncError, SyncResult};
