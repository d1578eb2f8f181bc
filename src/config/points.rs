//! Point values per award tier for the yearly board

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::domain::AwardTier;

/// Points granted per tier; `NONE` is always worth nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointTable {
    #[serde(default = "default_participation")]
    pub participation: u64,

    #[serde(default = "default_beaten")]
    pub beaten: u64,

    #[serde(default = "default_mastered")]
    pub mastered: u64,
}

fn default_participation() -> u64 {
    1
}

fn default_beaten() -> u64 {
    3
}

fn default_mastered() -> u64 {
    5
}

impl Default for PointTable {
    fn default() -> Self {
        Self {
            participation: default_participation(),
            beaten: default_beaten(),
            mastered: default_mastered(),
        }
    }
}

impl PointTable {
    pub fn points_for(&self, tier: AwardTier) -> u64 {
        match tier {
            AwardTier::None => 0,
            AwardTier::Participation => self.participation,
            AwardTier::Beaten => self.beaten,
            AwardTier::Mastered => self.mastered,
        }
    }

    /// A higher tier must never be worth less than a lower one
    pub fn validate(&self) -> Result<()> {
        if self.participation > self.beaten || self.beaten > self.mastered {
            bail!(
                "Point table must be ascending (participation {} <= beaten {} <= mastered {})",
                self.participation,
                self.beaten,
                self.mastered
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_lookup() {
        let table = PointTable::default();
        assert_eq!(table.points_for(AwardTier::None), 0);
        assert_eq!(table.points_for(AwardTier::Participation), 1);
        assert_eq!(table.points_for(AwardTier::Beaten), 3);
        assert_eq!(table.points_for(AwardTier::Mastered), 5);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_descending_table_is_rejected() {
        let table = PointTable {
            participation: 1,
            beaten: 6,
            mastered: 5,
        };
        assert!(table.validate().is_err());
    }
}
