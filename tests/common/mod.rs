//! Shared test utilities: temp store, scripted achievement source, recording sink

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use challenge_board::announce::{Announcement, AnnouncementSink, TierUpgrade};
use challenge_board::domain::{
    AwardTier, ChallengeGame, ChallengeKind, GameProgress, Period, UnlockedAchievement,
};
use challenge_board::source::AchievementSource;
use challenge_board::store::Store;
use challenge_board::sync::{SyncDriver, SyncSettings};
use challenge_board::{SyncError, SyncResult};

/// A store backed by a file in a temp dir that lives as long as this value
pub struct TestBoard {
    _dir: TempDir,
    pub store: Store,
}

impl TestBoard {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = Store::open(&dir.path().join("board.db")).expect("Failed to open store");
        Self { _dir: dir, store }
    }

    pub fn register(&self, names: &[&str]) {
        for name in names {
            self.store.users().register(name).expect("Failed to register user");
        }
    }

    pub fn add_challenge(&self, game: &ChallengeGame) {
        self.store.challenges().upsert(game).expect("Failed to store challenge");
    }

    pub fn driver(&self, source: Arc<FakeSource>, sink: Arc<RecordingSink>) -> SyncDriver {
        SyncDriver::new(
            self.store.clone(),
            source,
            sink,
            SyncSettings {
                poll_interval: Duration::from_secs(60),
                user_delay: Duration::ZERO,
                max_lookback_minutes: 1440,
            },
        )
    }
}

/// Achievement source that serves scripted responses and counts calls
#[derive(Default)]
pub struct FakeSource {
    recent: Mutex<HashMap<String, Vec<UnlockedAchievement>>>,
    progress: Mutex<HashMap<(String, String), SyncResult<GameProgress>>>,
    failing: Mutex<HashSet<String>>,
    progress_calls: Mutex<HashMap<(String, String), usize>>,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_unlock(&self, user: &str, unlock: UnlockedAchievement) {
        self.recent
            .lock()
            .unwrap()
            .entry(user.to_string())
            .or_default()
            .push(unlock);
    }

    pub fn set_progress(&self, user: &str, game_id: &str, progress: GameProgress) {
        self.progress
            .lock()
            .unwrap()
            .insert((user.to_string(), game_id.to_string()), Ok(progress));
    }

    pub fn set_progress_error(&self, user: &str, game_id: &str, error: SyncError) {
        self.progress
            .lock()
            .unwrap()
            .insert((user.to_string(), game_id.to_string()), Err(error));
    }

    /// Every fetch for `user` fails with a transient error until `recover`
    pub fn fail_user(&self, user: &str) {
        self.failing.lock().unwrap().insert(user.to_string());
    }

    pub fn recover(&self, user: &str) {
        self.failing.lock().unwrap().remove(user);
    }

    pub fn progress_calls(&self, user: &str, game_id: &str) -> usize {
        self.progress_calls
            .lock()
            .unwrap()
            .get(&(user.to_string(), game_id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn check_failing(&self, user: &str) -> SyncResult<()> {
        if self.failing.lock().unwrap().contains(user) {
            return Err(SyncError::TransientFetch(format!("{user}: connection reset")));
        }
        Ok(())
    }
}

#[async_trait]
impl AchievementSource for FakeSource {
    async fn recent_achievements(
        &self,
        username: &str,
        _lookback_minutes: u32,
    ) -> SyncResult<Vec<UnlockedAchievement>> {
        self.check_failing(username)?;
        Ok(self
            .recent
            .lock()
            .unwrap()
            .get(username)
            .cloned()
            .unwrap_or_default())
    }

    async fn game_progress(&self, username: &str, game_id: &str) -> SyncResult<GameProgress> {
        self.check_failing(username)?;
        let key = (username.to_string(), game_id.to_string());
        *self.progress_calls.lock().unwrap().entry(key.clone()).or_default() += 1;

        match self.progress.lock().unwrap().get(&key) {
            Some(Ok(progress)) => Ok(progress.clone()),
            Some(Err(SyncError::MalformedPayload(msg))) => Err(SyncError::MalformedPayload(msg.clone())),
            Some(Err(e)) => Err(SyncError::TransientFetch(e.to_string())),
            None => Ok(GameProgress::default()),
        }
    }
}

/// Sink that records every announcement; can be told to fail
#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<Announcement>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<Announcement> {
        self.seen.lock().unwrap().clone()
    }

    pub fn unlocks(&self) -> Vec<UnlockedAchievement> {
        self.all()
            .into_iter()
            .filter_map(|a| match a {
                Announcement::AchievementUnlocked { achievement, .. } => Some(achievement),
                _ => None,
            })
            .collect()
    }

    pub fn upgrades(&self) -> Vec<TierUpgrade> {
        self.all()
            .into_iter()
            .filter_map(|a| match a {
                Announcement::AwardTierChanged(upgrade) => Some(upgrade),
                _ => None,
            })
            .collect()
    }

    fn record(&self, announcement: Announcement) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("chat service unavailable");
        }
        self.seen.lock().unwrap().push(announcement);
        Ok(())
    }
}

#[async_trait]
impl AnnouncementSink for RecordingSink {
    async fn on_achievement_unlocked(
        &self,
        username: &str,
        achievement: &UnlockedAchievement,
        game: Option<&ChallengeGame>,
    ) -> anyhow::Result<()> {
        self.record(Announcement::AchievementUnlocked {
            username: username.to_string(),
            achievement: achievement.clone(),
            game: game.cloned(),
        })
    }

    async fn on_award_tier_changed(&self, upgrade: &TierUpgrade) -> anyhow::Result<()> {
        self.record(Announcement::AwardTierChanged(upgrade.clone()))
    }

    async fn on_manual_points_awarded(
        &self,
        username: &str,
        points: i64,
        reason: &str,
    ) -> anyhow::Result<()> {
        self.record(Announcement::ManualPointsAwarded {
            username: username.to_string(),
            points,
            reason: reason.to_string(),
        })
    }
}

pub fn ids(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Monthly game: win with W1 (or W2), progression P1, 4 achievements
pub fn monthly_game(game_id: &str, period: Period) -> ChallengeGame {
    ChallengeGame {
        game_id: game_id.to_string(),
        title: Some(format!("Game {game_id}")),
        period,
        kind: ChallengeKind::Monthly,
        total_achievements: 4,
        win_conditions: ids(&["W1", "W2"]),
        progression: ids(&["P1"]),
        require_all_win_conditions: false,
        allows_mastery: true,
    }
}

pub fn unlock(achievement_id: &str, game_id: &str, unlocked_at: i64) -> UnlockedAchievement {
    UnlockedAchievement {
        achievement_id: achievement_id.to_string(),
        game_id: game_id.to_string(),
        unlocked_at,
        title: None,
        game_title: None,
    }
}

pub fn progress(earned: &[&str], total: u32) -> GameProgress {
    GameProgress {
        earned_count: earned.len() as u32,
        total_count: total,
        completion_percent: earned.len() as f64 * 100.0 / total as f64,
        earned_achievement_ids: ids(earned),
    }
}

pub fn tier_of(store: &Store, user: &str, game_id: &str, period: Period) -> AwardTier {
    store
        .awards()
        .get(&challenge_board::domain::AwardKey::new(user, game_id, period))
        .unwrap()
        .map(|s| s.award.tier)
        .unwrap_or_default()
}
