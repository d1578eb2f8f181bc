//! Leaderboard snapshot types

use serde::{Deserialize, Serialize};

use super::award::AwardTier;

/// Which leaderboard a snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardScope {
    Monthly,
    Yearly,
}

impl LeaderboardScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

impl std::fmt::Display for LeaderboardScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope-specific detail for a ranked entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryDetail {
    Monthly {
        total_achievements: u32,
        completion_percent: f64,
        tier: AwardTier,
    },
    Yearly {
        challenge_points: u64,
        manual_points: i64,
        mastered: u32,
        beaten: u32,
        participation: u32,
    },
}

/// One ranked row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Competition rank: ties share a rank, the next rank skips
    pub rank: u32,
    pub username: String,
    /// Value the board is sorted by (achievement count or points)
    pub score: u64,
    pub detail: EntryDetail,
}

/// A complete computed leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub scope: LeaderboardScope,
    /// "YYYY-MM" for monthly boards, "YYYY" for yearly boards
    pub label: String,
    /// Game the monthly board was computed for
    pub game_id: Option<String>,
    pub entries: Vec<LeaderboardEntry>,
    /// Entries ranked at or above this rank form the top slice
    pub top_slice: u32,
    /// ms since epoch
    pub last_update: i64,
}

impl LeaderboardSnapshot {
    /// Entries shown prominently. Ties at the boundary stay together.
    pub fn top(&self) -> &[LeaderboardEntry] {
        &self.entries[..self.split_index()]
    }

    /// Everything after the top slice
    pub fn rest(&self) -> &[LeaderboardEntry] {
        &self.entries[self.split_index()..]
    }

    fn split_index(&self) -> usize {
        self.entries
            .iter()
            .position(|e| e.rank > self.top_slice)
            .unwrap_or(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: u32, name: &str) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            username: name.to_string(),
            score: 0,
            detail: EntryDetail::Yearly {
                challenge_points: 0,
                manual_points: 0,
                mastered: 0,
                beaten: 0,
                participation: 0,
            },
        }
    }

    #[test]
    fn test_top_and_rest_keep_ties_together() {
        let snapshot = LeaderboardSnapshot {
            scope: LeaderboardScope::Yearly,
            label: "2025".to_string(),
            game_id: None,
            entries: vec![
                entry(1, "a"),
                entry(2, "b"),
                entry(3, "c"),
                entry(3, "d"),
                entry(5, "e"),
            ],
            top_slice: 3,
            last_update: 0,
        };
        let top: Vec<_> = snapshot.top().iter().map(|e| e.username.as_str()).collect();
        let rest: Vec<_> = snapshot.rest().iter().map(|e| e.username.as_str()).collect();
        assert_eq!(top, ["a", "b", "c", "d"]);
        assert_eq!(rest, ["e"]);
    }
}
