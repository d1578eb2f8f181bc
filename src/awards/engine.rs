//! Award tier state machine
//!
//! `NONE -> PARTICIPATION -> BEATEN -> MASTERED`, forward only per
//! (user, game, period). The engine reads the stored award, decides, and
//! writes conditionally on the revision it read.

use tracing::{debug, info};

use crate::announce::TierUpgrade;
use crate::domain::{AwardKey, AwardTier, ChallengeGame, GameProgress};
use crate::error::{SyncError, SyncResult};
use crate::store::{AwardStore, AwardUpdate, StoredAward};

/// Highest tier the progress qualifies for, ignoring what is stored
pub fn candidate_tier(game: &ChallengeGame, progress: &GameProgress) -> AwardTier {
    if progress.earned_count == 0 && progress.earned_achievement_ids.is_empty() {
        return AwardTier::None;
    }

    if game.allows_mastery && progress.is_complete() {
        return AwardTier::Mastered;
    }
    if is_beaten(game, progress) {
        return AwardTier::Beaten;
    }
    AwardTier::Participation
}

fn is_beaten(game: &ChallengeGame, progress: &GameProgress) -> bool {
    if !game.can_be_beaten() {
        return false;
    }

    // No win conditions: progression alone decides
    let won = game.win_conditions.is_empty()
        || if game.require_all_win_conditions {
            game.win_conditions.iter().all(|id| progress.has_earned(id))
        } else {
            game.win_conditions.iter().any(|id| progress.has_earned(id))
        };

    won && game.progression.iter().all(|id| progress.has_earned(id))
}

/// What a call to [`AwardEngine::apply`] did to the stored award
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierChange {
    /// First qualifying progress; row created at this tier
    Created(AwardTier),
    Upgraded { from: AwardTier, to: AwardTier },
    /// Same tier, higher counts
    CountsRefreshed,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AwardOutcome {
    pub key: AwardKey,
    pub change: TierChange,
    /// Tier stored after the call
    pub tier: AwardTier,
    /// Set when the tier went up; the caller announces it
    pub upgrade: Option<TierUpgrade>,
}

/// Converts progress summaries into stored award tiers
#[derive(Clone)]
pub struct AwardEngine {
    awards: AwardStore,
}

impl AwardEngine {
    pub fn new(awards: AwardStore) -> Self {
        Self { awards }
    }

    /// Evaluate `progress` against `game` and store the result.
    ///
    /// Losing a race to another writer is retried once with a fresh read; a
    /// second loss is returned to the caller.
    pub fn apply(
        &self,
        username: &str,
        game: &ChallengeGame,
        progress: &GameProgress,
    ) -> SyncResult<AwardOutcome> {
        match self.try_apply(username, game, progress) {
            Err(SyncError::ConcurrentUpdateConflict(key)) | Err(SyncError::TierRegression { key, .. }) => {
                debug!(award = %key, "Award changed underneath us, retrying");
                self.try_apply(username, game, progress)
            }
            other => other,
        }
    }

    fn try_apply(
        &self,
        username: &str,
        game: &ChallengeGame,
        progress: &GameProgress,
    ) -> SyncResult<AwardOutcome> {
        let key = AwardKey::new(username, &game.game_id, game.period);
        let candidate = candidate_tier(game, progress);
        let stored = self.awards.get(&key)?;

        let total = if progress.total_count > 0 {
            progress.total_count
        } else {
            game.total_achievements
        };
        let mut update = AwardUpdate {
            tier: candidate,
            achievement_count: progress.earned_count,
            total_achievements: total,
            completion_percent: progress.completion_percent,
        };

        let (change, tier) = match stored {
            None if candidate == AwardTier::None => (TierChange::Unchanged, AwardTier::None),
            None => {
                self.awards.write_if_revision(&key, &update, None)?;
                (TierChange::Created(candidate), candidate)
            }
            Some(StoredAward { award, revision }) => {
                let current = award.tier;
                if candidate > current {
                    update.achievement_count = update.achievement_count.max(award.achievement_count);
                    update.completion_percent = update.completion_percent.max(award.completion_percent);
                    self.awards.write_if_revision(&key, &update, Some(revision))?;
                    (TierChange::Upgraded { from: current, to: candidate }, candidate)
                } else if progress.earned_count > award.achievement_count {
                    update.tier = current;
                    update.completion_percent = update.completion_percent.max(award.completion_percent);
                    self.awards.write_if_revision(&key, &update, Some(revision))?;
                    (TierChange::CountsRefreshed, current)
                } else {
                    (TierChange::Unchanged, current)
                }
            }
        };

        let previous = match change {
            TierChange::Created(_) => Some(AwardTier::None),
            TierChange::Upgraded { from, .. } => Some(from),
            _ => None,
        };
        let upgrade = previous.map(|previous| {
            info!(award = %key, from = %previous, to = %tier, "Award tier raised");
            TierUpgrade {
                username: username.to_string(),
                game: game.clone(),
                previous,
                tier,
                earned_count: progress.earned_count,
                total_count: total,
            }
        });

        Ok(AwardOutcome { key, change, tier, upgrade })
    }
}
