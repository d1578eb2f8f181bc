//! Configuration loading and management

mod io;
mod points;
mod settings;
mod source;

pub use io::{write_config, Overwrite};
pub use points::PointTable;
pub use settings::Settings;
pub use source::SourceSettings;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::ChallengeGame;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// Achievement service connection
    #[serde(default)]
    pub source: SourceSettings,

    /// Yearly point values
    #[serde(default)]
    pub points: PointTable,

    /// Challenge games, upserted into the store at startup
    #[serde(default)]
    pub challenges: Vec<ChallengeGame>,
}

impl Config {
    /// Load and validate configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Reject values the core would misbehave on
    pub fn validate(&self) -> Result<()> {
        self.points.validate()?;

        if self.settings.top_slice == 0 {
            bail!("settings.top_slice must be at least 1");
        }

        for game in &self.challenges {
            if game.game_id.trim().is_empty() {
                bail!("Challenge with an empty game_id");
            }
            if !game.period.is_valid() {
                bail!(
                    "Challenge {} has an invalid period {}-{}",
                    game.game_id,
                    game.period.year,
                    game.period.month
                );
            }
        }
        Ok(())
    }

    /// Database location: configured path, else `board.db` in the global dir
    pub fn database_path(&self) -> PathBuf {
        self.settings
            .database_path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("board.db"))
    }
}
