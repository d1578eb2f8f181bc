//! Challenge game definitions

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::period::Period;

/// Which challenge track a game belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChallengeKind {
    /// The main game of the month
    Monthly,
    /// The optional side game of the month
    Shadow,
}

impl ChallengeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "MONTHLY",
            Self::Shadow => "SHADOW",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MONTHLY" => Some(Self::Monthly),
            "SHADOW" => Some(Self::Shadow),
            _ => None,
        }
    }
}

/// A game selected for a challenge in a given period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeGame {
    /// Identifier of the game in the achievement service
    pub game_id: String,

    /// Human readable title (optional, used in announcements)
    #[serde(default)]
    pub title: Option<String>,

    #[serde(flatten)]
    pub period: Period,

    pub kind: ChallengeKind,

    /// Number of achievements in the game's set
    #[serde(default)]
    pub total_achievements: u32,

    /// Achievements that count as "winning" the game
    #[serde(default)]
    pub win_conditions: BTreeSet<String>,

    /// Achievements that must all be earned before the game counts as beaten
    #[serde(default)]
    pub progression: BTreeSet<String>,

    /// true: every win condition is required; false: any single one is enough
    #[serde(default)]
    pub require_all_win_conditions: bool,

    /// Whether 100% completion upgrades the award to MASTERED
    #[serde(default = "default_allows_mastery")]
    pub allows_mastery: bool,
}

fn default_allows_mastery() -> bool {
    true
}

impl ChallengeGame {
    /// A game with no win or progression requirements can never be beaten
    pub fn can_be_beaten(&self) -> bool {
        !self.win_conditions.is_empty() || !self.progression.is_empty()
    }

    /// Title for display, falling back to the game id
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.game_id)
    }
}
