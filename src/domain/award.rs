//! Award tiers and award records

use serde::{Deserialize, Serialize};

use super::period::Period;

/// Game id prefix marking a manual (non-challenge) award row
pub const MANUAL_GAME_PREFIX: &str = "manual:";

/// Ordered award level for a challenge game in a period.
///
/// Declaration order is the upgrade order; the derived `Ord` relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AwardTier {
    #[default]
    None,
    Participation,
    Beaten,
    Mastered,
}

impl AwardTier {
    pub const ALL: [AwardTier; 4] = [
        AwardTier::None,
        AwardTier::Participation,
        AwardTier::Beaten,
        AwardTier::Mastered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Participation => "PARTICIPATION",
            Self::Beaten => "BEATEN",
            Self::Mastered => "MASTERED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Some(Self::None),
            "PARTICIPATION" => Some(Self::Participation),
            "BEATEN" => Some(Self::Beaten),
            "MASTERED" => Some(Self::Mastered),
            _ => None,
        }
    }

    /// Integer stored in the database (0..=3)
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::None => 0,
            Self::Participation => 1,
            Self::Beaten => 2,
            Self::Mastered => 3,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Participation),
            2 => Some(Self::Beaten),
            3 => Some(Self::Mastered),
            _ => None,
        }
    }
}

impl std::fmt::Display for AwardTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique key of an award row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AwardKey {
    pub username: String,
    pub game_id: String,
    pub period: Period,
}

impl AwardKey {
    pub fn new(username: impl Into<String>, game_id: impl Into<String>, period: Period) -> Self {
        Self {
            username: username.into(),
            game_id: game_id.into(),
            period,
        }
    }
}

impl std::fmt::Display for AwardKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.username, self.game_id, self.period)
    }
}

/// Metadata for points granted by hand rather than earned in a challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualAward {
    pub reason: String,
    pub grantor: String,
    pub points: i64,
}

/// A user's standing in one challenge game for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub username: String,
    pub game_id: String,
    pub period: Period,
    pub tier: AwardTier,
    pub achievement_count: u32,
    pub total_achievements: u32,
    pub completion_percent: f64,
    pub manual: Option<ManualAward>,
}

impl Award {
    pub fn key(&self) -> AwardKey {
        AwardKey::new(self.username.clone(), self.game_id.clone(), self.period)
    }

    pub fn is_manual(&self) -> bool {
        self.manual.is_some() || self.game_id.starts_with(MANUAL_GAME_PREFIX)
    }
}
