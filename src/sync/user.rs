//! Incremental sync of one user's recent unlocks

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info, warn};

use crate::announce::AnnouncementSink;
use crate::awards::{AwardEngine, AwardOutcome};
use crate::domain::{ChallengeGame, GameProgress, UnlockedAchievement};
use crate::error::{SyncError, SyncResult};
use crate::source::AchievementSource;
use crate::store::ProgressStore;

/// Counters for one user in one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSyncReport {
    pub username: String,
    /// Unlocks returned by the source
    pub fetched: usize,
    /// Unlocks announced for the first time
    pub new_unlocks: usize,
    /// Unlocks already announced in an earlier cycle
    pub replayed: usize,
    pub upgrades: usize,
    /// Award evaluations skipped on bad data; retried next cycle
    pub skipped: usize,
    /// Evaluations deferred by an earlier cycle that ran here
    pub recovered: usize,
}

/// Borrowed collaborators for syncing a single user
pub(super) struct UserSync<'a> {
    pub source: &'a dyn AchievementSource,
    pub sink: &'a dyn AnnouncementSink,
    pub progress: &'a ProgressStore,
    pub engine: &'a AwardEngine,
    pub active_games: &'a [ChallengeGame],
}

impl UserSync<'_> {
    /// Process every unlock newer than `watermark`, oldest first.
    ///
    /// Each unlock is fully persisted before the next one is looked at, so a
    /// failure part way through keeps the work already done.
    pub async fn run(
        &self,
        username: &str,
        watermark: Option<i64>,
        lookback_minutes: u32,
    ) -> SyncResult<UserSyncReport> {
        let mut report = UserSyncReport {
            username: username.to_string(),
            ..Default::default()
        };

        let unlocks = self.source.recent_achievements(username, lookback_minutes).await?;
        report.fetched = unlocks.len();

        let mut fresh: Vec<UnlockedAchievement> = unlocks
            .into_iter()
            .filter(|u| watermark.is_none_or(|w| u.unlocked_at > w))
            .collect();
        fresh.sort_by(|a, b| {
            a.unlocked_at
                .cmp(&b.unlocked_at)
                .then_with(|| a.achievement_id.cmp(&b.achievement_id))
        });

        // One progress fetch per game per cycle; `None` marks bad data
        let mut summaries: HashMap<String, Option<GameProgress>> = HashMap::new();
        let mut pending = self.progress.pending_games(username)?;

        for unlock in &fresh {
            let dedup_key = unlock.dedup_key();
            if self.progress.is_announced(username, &unlock.game_id, &dedup_key)? {
                report.replayed += 1;
                continue;
            }

            let game = self.active_games.iter().find(|g| g.game_id == unlock.game_id);
            let outcome = match game {
                Some(game) => self
                    .evaluate(username, game, &mut summaries, &mut pending, &mut report)
                    .await?,
                None => None,
            };

            self.progress.record_processed(
                username,
                &unlock.game_id,
                &dedup_key,
                unlock.unlocked_at,
                outcome.as_ref().map(|o| o.tier),
            )?;
            report.new_unlocks += 1;

            if let Err(e) = self.sink.on_achievement_unlocked(username, unlock, game).await {
                warn!(user = username, achievement = %unlock.achievement_id, error = %e, "Failed to announce unlock");
            }

            self.announce_upgrade(username, outcome, &mut report).await;
        }

        // Evaluations deferred by earlier cycles whose game saw no unlock now
        let deferred: Vec<String> = pending
            .iter()
            .filter(|game_id| !summaries.contains_key(*game_id))
            .cloned()
            .collect();
        for game_id in deferred {
            let Some(game) = self.active_games.iter().find(|g| g.game_id == game_id) else {
                info!(user = username, game = %game_id, "Challenge no longer active, dropping deferred evaluation");
                self.progress.set_pending(username, &game_id, false)?;
                continue;
            };
            let outcome = self
                .evaluate(username, game, &mut summaries, &mut pending, &mut report)
                .await?;
            if outcome.is_some() {
                report.recovered += 1;
            }
            self.announce_upgrade(username, outcome, &mut report).await;
        }

        debug!(
            user = username,
            fetched = report.fetched,
            new = report.new_unlocks,
            replayed = report.replayed,
            upgrades = report.upgrades,
            recovered = report.recovered,
            "User synced"
        );
        Ok(report)
    }

    async fn announce_upgrade(
        &self,
        username: &str,
        outcome: Option<AwardOutcome>,
        report: &mut UserSyncReport,
    ) {
        if let Some(upgrade) = outcome.and_then(|o| o.upgrade) {
            report.upgrades += 1;
            if let Err(e) = self.sink.on_award_tier_changed(&upgrade).await {
                warn!(user = username, game = %upgrade.game.game_id, error = %e, "Failed to announce award upgrade");
            }
        }
    }

    /// Run the award engine for one challenge game.
    ///
    /// Bad data skips the evaluation and leaves the game pending so a later
    /// cycle re-runs it without needing a new unlock. Fetch and storage
    /// failures abort the user.
    async fn evaluate(
        &self,
        username: &str,
        game: &ChallengeGame,
        summaries: &mut HashMap<String, Option<GameProgress>>,
        pending: &mut BTreeSet<String>,
        report: &mut UserSyncReport,
    ) -> SyncResult<Option<AwardOutcome>> {
        let summary = match summaries.get(&game.game_id) {
            Some(Some(summary)) => summary.clone(),
            Some(None) => {
                report.skipped += 1;
                return Ok(None);
            }
            None => match self.source.game_progress(username, &game.game_id).await {
                Ok(summary) => {
                    summaries.insert(game.game_id.clone(), Some(summary.clone()));
                    summary
                }
                Err(e @ (SyncError::MalformedPayload(_) | SyncError::DataIntegrity(_))) => {
                    warn!(user = username, game = %game.game_id, error = %e, "Deferring award evaluation");
                    summaries.insert(game.game_id.clone(), None);
                    if pending.insert(game.game_id.clone()) {
                        self.progress.set_pending(username, &game.game_id, true)?;
                    }
                    report.skipped += 1;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            },
        };

        let outcome = self.engine.apply(username, game, &summary)?;
        if pending.remove(&game.game_id) {
            self.progress.set_pending(username, &game.game_id, false)?;
        }
        Ok(Some(outcome))
    }
}
