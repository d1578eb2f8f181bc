//! Shared setup for commands that touch the store

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use challenge_board::config::Config;
use challenge_board::leaderboard::LeaderboardAggregator;
use challenge_board::store::Store;

/// Loaded config plus an open store with the configured challenges applied
pub struct App {
    pub config: Config,
    pub store: Store,
}

impl App {
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_path)?;
        let db_path = config.database_path();
        let store = Store::open(&db_path)?;
        debug!("Opened board database at {}", db_path.display());

        let challenges = store.challenges();
        for game in &config.challenges {
            challenges
                .upsert(game)
                .with_context(|| format!("Failed to store challenge {}", game.game_id))?;
        }

        Ok(Self { config, store })
    }

    pub fn aggregator(&self) -> LeaderboardAggregator {
        LeaderboardAggregator::new(
            self.store.clone(),
            self.config.points,
            self.config.settings.top_slice,
        )
    }
}
