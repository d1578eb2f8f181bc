//! Init command implementation

use std::path::PathBuf;

use anyhow::{bail, Result};

use challenge_board::config::{write_config, Config, Overwrite};

/// Default configuration content for `challenge-board init`
pub const DEFAULT_CONFIG: &str = r#"# Challenge Board Configuration
# =============================
#
# Polls an achievement service for each registered user, turns unlocks in
# challenge games into award tiers and keeps monthly/yearly leaderboards.

# ============================================================================
# SETTINGS
# ============================================================================
#
#   database_path             - SQLite file (default: ~/.challenge-board/board.db)
#   poll_interval_secs        - Seconds between sync cycles (default: 900)
#   user_delay_ms             - Minimum delay between users in a cycle (default: 1500)
#   max_lookback_minutes      - Largest window requested from the service (default: 1440)
#   top_slice                 - Ranks shown above the fold (default: 5)
#   leaderboard_interval_secs - Seconds between leaderboard refreshes (default: 300)

[settings]
poll_interval_secs = 900
user_delay_ms = 1500
max_lookback_minutes = 1440
top_slice = 5
leaderboard_interval_secs = 300

# ============================================================================
# SOURCE - Achievement service
# ============================================================================
#
# The API key may be left empty here and provided through the
# CHALLENGE_BOARD_API_KEY environment variable instead.

[source]
base_url = "https://retroachievements.org/API"
api_user = ""
api_key = ""
timeout_secs = 30
recent_limit = 50

# ============================================================================
# POINTS - Yearly leaderboard values per award tier
# ============================================================================
#
# Must be ascending: participation <= beaten <= mastered.

[points]
participation = 1
beaten = 3
mastered = 5

# ============================================================================
# CHALLENGES - One entry per game and month
# ============================================================================
#
#   kind                       - "MONTHLY" or "SHADOW"
#   win_conditions             - Achievement ids that count as beating the game
#   require_all_win_conditions - All of them (true) or any one (false, default)
#   progression                - Achievement ids that must all be earned to beat it
#   allows_mastery             - Whether 100% completion awards MASTERED (default: true)
#
# [[challenges]]
# game_id = "1234"
# title = "Example Game"
# month = 1
# year = 2025
# kind = "MONTHLY"
# total_achievements = 50
# win_conditions = ["98765"]
# progression = ["98760", "98761"]
"#;

/// Write the default configuration file
pub async fn init_command(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    let overwrite = if force { Overwrite::Replace } else { Overwrite::Refuse };
    if !write_config(&config_path, DEFAULT_CONFIG, overwrite)? {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }
    println!("Created: {}", config_path.display());

    Ok(())
}
