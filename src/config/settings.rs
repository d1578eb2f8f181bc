//! Settings configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sync::SyncSettings;

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite database file; defaults to `board.db` next to the global config
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Seconds between sync cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Minimum delay between two users within a cycle, in milliseconds
    #[serde(default = "default_user_delay_ms")]
    pub user_delay_ms: u64,

    /// Upper bound of the lookback window requested from the source
    #[serde(default = "default_max_lookback_minutes")]
    pub max_lookback_minutes: u32,

    /// Ranks at or above this value form a board's top slice
    #[serde(default = "default_top_slice")]
    pub top_slice: u32,

    /// Seconds between leaderboard recomputations in `run`
    #[serde(default = "default_leaderboard_interval_secs")]
    pub leaderboard_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    900
}

fn default_user_delay_ms() -> u64 {
    1500
}

fn default_max_lookback_minutes() -> u32 {
    1440
}

fn default_top_slice() -> u32 {
    5
}

fn default_leaderboard_interval_secs() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: None,
            poll_interval_secs: default_poll_interval_secs(),
            user_delay_ms: default_user_delay_ms(),
            max_lookback_minutes: default_max_lookback_minutes(),
            top_slice: default_top_slice(),
            leaderboard_interval_secs: default_leaderboard_interval_secs(),
        }
    }
}

impl Settings {
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            user_delay: Duration::from_millis(self.user_delay_ms),
            max_lookback_minutes: self.max_lookback_minutes,
        }
    }

    pub fn leaderboard_interval(&self) -> Duration {
        Duration::from_secs(self.leaderboard_interval_secs.max(1))
    }
}
