//! Announcement sinks
//!
//! The core calls an [`AnnouncementSink`] after state is persisted. Delivery is
//! best effort: a failed announcement is logged by the caller and never undoes
//! a stored award.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::{AwardTier, ChallengeGame, UnlockedAchievement};

/// A stored tier increase for one (user, game, period)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierUpgrade {
    pub username: String,
    pub game: ChallengeGame,
    pub previous: AwardTier,
    pub tier: AwardTier,
    pub earned_count: u32,
    pub total_count: u32,
}

/// Receiver of user-facing notifications
#[async_trait]
pub trait AnnouncementSink: Send + Sync {
    /// A new unlock; `game` is set when it belongs to an active challenge
    async fn on_achievement_unlocked(
        &self,
        username: &str,
        achievement: &UnlockedAchievement,
        game: Option<&ChallengeGame>,
    ) -> Result<()>;

    /// A persisted tier upgrade
    async fn on_award_tier_changed(&self, upgrade: &TierUpgrade) -> Result<()>;

    /// A manual point grant
    async fn on_manual_points_awarded(&self, username: &str, points: i64, reason: &str) -> Result<()>;
}

/// Owned form of every notification, for channels and recorders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Announcement {
    AchievementUnlocked {
        username: String,
        achievement: UnlockedAchievement,
        game: Option<ChallengeGame>,
    },
    AwardTierChanged(TierUpgrade),
    ManualPointsAwarded {
        username: String,
        points: i64,
        reason: String,
    },
}

/// Writes announcements to the log
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

#[async_trait]
impl AnnouncementSink for TracingSink {
    async fn on_achievement_unlocked(
        &self,
        username: &str,
        achievement: &UnlockedAchievement,
        game: Option<&ChallengeGame>,
    ) -> Result<()> {
        info!(
            user = username,
            achievement = %achievement.achievement_id,
            title = achievement.title.as_deref().unwrap_or("-"),
            game = achievement.game_title.as_deref().unwrap_or(&achievement.game_id),
            challenge = game.map(|g| g.kind.as_str()).unwrap_or("-"),
            "Achievement unlocked"
        );
        Ok(())
    }

    async fn on_award_tier_changed(&self, upgrade: &TierUpgrade) -> Result<()> {
        info!(
            user = %upgrade.username,
            game = upgrade.game.display_title(),
            from = %upgrade.previous,
            to = %upgrade.tier,
            earned = upgrade.earned_count,
            total = upgrade.total_count,
            "Award upgraded"
        );
        Ok(())
    }

    async fn on_manual_points_awarded(&self, username: &str, points: i64, reason: &str) -> Result<()> {
        info!(user = username, points, reason, "Manual points awarded");
        Ok(())
    }
}

/// Forwards announcements to a presentation layer over a channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Announcement>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Announcement>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end, with room for `capacity` pending messages
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Announcement>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    async fn send(&self, announcement: Announcement) -> Result<()> {
        self.tx
            .send(announcement)
            .await
            .map_err(|_| anyhow::anyhow!("Announcement receiver dropped"))
    }
}

#[async_trait]
impl AnnouncementSink for ChannelSink {
    async fn on_achievement_unlocked(
        &self,
        username: &str,
        achievement: &UnlockedAchievement,
        game: Option<&ChallengeGame>,
    ) -> Result<()> {
        self.send(Announcement::AchievementUnlocked {
            username: username.to_string(),
            achievement: achievement.clone(),
            game: game.cloned(),
        })
        .await
    }

    async fn on_award_tier_changed(&self, upgrade: &TierUpgrade) -> Result<()> {
        self.send(Announcement::AwardTierChanged(upgrade.clone())).await
    }

    async fn on_manual_points_awarded(&self, username: &str, points: i64, reason: &str) -> Result<()> {
        self.send(Announcement::ManualPointsAwarded {
            username: username.to_string(),
            points,
            reason: reason.to_string(),
        })
        .await
    }
}

/// Delivers every announcement to all inner sinks.
///
/// Each sink is tried even if an earlier one failed; the first error is
/// returned.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn AnnouncementSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn AnnouncementSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn AnnouncementSink>) {
        self.sinks.push(sink);
    }

    fn first_error(results: Vec<Result<()>>) -> Result<()> {
        let mut first = None;
        for result in results {
            if let Err(e) = result {
                warn!(error = %e, "Announcement sink failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl AnnouncementSink for FanoutSink {
    async fn on_achievement_unlocked(
        &self,
        username: &str,
        achievement: &UnlockedAchievement,
        game: Option<&ChallengeGame>,
    ) -> Result<()> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.on_achievement_unlocked(username, achievement, game).await);
        }
        Self::first_error(results)
    }

    async fn on_award_tier_changed(&self, upgrade: &TierUpgrade) -> Result<()> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.on_award_tier_changed(upgrade).await);
        }
        Self::first_error(results)
    }

    async fn on_manual_points_awarded(&self, username: &str, points: i64, reason: &str) -> Result<()> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.on_manual_points_awarded(username, points, reason).await);
        }
        Self::first_error(results)
    }
}
