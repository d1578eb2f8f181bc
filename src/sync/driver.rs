//! Periodic sync driver
//!
//! One cycle walks every active user sequentially, throttled by the
//! [`RateLimiter`]. A user's failure is logged and recorded in the
//! [`CycleReport`]; it never stops the other users. The watermark moves to
//! the cycle start only when every user completed and the cycle was not
//! stopped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::rate_limit::RateLimiter;
use super::stop::StopSignal;
use super::user::{UserSync, UserSyncReport};
use crate::announce::AnnouncementSink;
use crate::awards::AwardEngine;
use crate::domain::{now_ms, Period};
use crate::error::SyncResult;
use crate::source::AchievementSource;
use crate::store::Store;

/// Timing knobs for the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub poll_interval: Duration,
    pub user_delay: Duration,
    pub max_lookback_minutes: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(900),
            user_delay: Duration::from_millis(1500),
            max_lookback_minutes: 1440,
        }
    }
}

/// Result of one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub started_at: i64,
    pub users_total: usize,
    pub users: Vec<UserSyncReport>,
    /// (username, error) for each user that failed
    pub failures: Vec<(String, String)>,
    pub stopped: bool,
    /// Watermark to use for the next cycle
    pub watermark: Option<i64>,
}

impl CycleReport {
    pub fn is_complete(&self) -> bool {
        !self.stopped && self.failures.is_empty() && self.users.len() == self.users_total
    }

    pub fn new_unlocks(&self) -> usize {
        self.users.iter().map(|u| u.new_unlocks).sum()
    }

    pub fn upgrades(&self) -> usize {
        self.users.iter().map(|u| u.upgrades).sum()
    }
}

/// Lookback window covering everything since `watermark`, clamped
pub fn lookback_minutes(watermark: Option<i64>, now: i64, max_minutes: u32) -> u32 {
    let max_minutes = max_minutes.max(1);
    match watermark {
        None => max_minutes,
        Some(w) => {
            let elapsed_ms = u64::try_from(now - w).unwrap_or(0);
            // Round up and add a minute of slack for clock skew
            let minutes = elapsed_ms.div_ceil(60_000) + 1;
            u32::try_from(minutes).unwrap_or(u32::MAX).clamp(1, max_minutes)
        }
    }
}

pub struct SyncDriver {
    store: Store,
    source: Arc<dyn AchievementSource>,
    sink: Arc<dyn AnnouncementSink>,
    engine: AwardEngine,
    limiter: Mutex<RateLimiter>,
    settings: SyncSettings,
}

impl SyncDriver {
    pub fn new(
        store: Store,
        source: Arc<dyn AchievementSource>,
        sink: Arc<dyn AnnouncementSink>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            engine: AwardEngine::new(store.awards()),
            limiter: Mutex::new(RateLimiter::new(settings.user_delay)),
            store,
            source,
            sink,
            settings,
        }
    }

    /// Run one cycle against `watermark` and report the next watermark.
    ///
    /// Only errors that prevent the cycle from starting (reading users or
    /// challenges) are returned; per-user errors land in the report.
    pub async fn run_cycle(&self, watermark: Option<i64>, stop: &StopSignal) -> SyncResult<CycleReport> {
        let started_at = now_ms();
        let users = self.store.users().active_users()?;
        let active_games = self
            .store
            .challenges()
            .active_for(Period::from_timestamp_ms(started_at))?;
        let lookback = lookback_minutes(watermark, started_at, self.settings.max_lookback_minutes);

        info!(
            users = users.len(),
            games = active_games.len(),
            lookback_minutes = lookback,
            "Starting sync cycle"
        );

        let progress = self.store.progress();
        let user_sync = UserSync {
            source: self.source.as_ref(),
            sink: self.sink.as_ref(),
            progress: &progress,
            engine: &self.engine,
            active_games: &active_games,
        };

        let mut report = CycleReport {
            started_at,
            users_total: users.len(),
            ..Default::default()
        };

        for user in &users {
            if stop.is_stopped() {
                report.stopped = true;
                break;
            }
            self.limiter.lock().await.acquire().await;

            match user_sync.run(&user.username, watermark, lookback).await {
                Ok(user_report) => report.users.push(user_report),
                Err(e) => {
                    if e.is_transient() {
                        warn!(user = %user.username, error = %e, "User sync failed, retrying next cycle");
                    } else {
                        error!(user = %user.username, error = %e, "User sync failed");
                    }
                    report.failures.push((user.username.clone(), e.to_string()));
                }
            }
        }

        report.watermark = if report.is_complete() {
            Some(watermark.map_or(started_at, |w| w.max(started_at)))
        } else {
            watermark
        };

        info!(
            synced = report.users.len(),
            failed = report.failures.len(),
            new_unlocks = report.new_unlocks(),
            upgrades = report.upgrades(),
            stopped = report.stopped,
            "Sync cycle finished"
        );
        Ok(report)
    }

    /// One cycle using the stored watermark, persisting the advanced one
    pub async fn run_once(&self, stop: &StopSignal) -> SyncResult<CycleReport> {
        let sync_state = self.store.sync_state();
        let watermark = sync_state.watermark()?;
        let report = self.run_cycle(watermark, stop).await?;

        if let Some(next) = report.watermark.filter(|next| Some(*next) != watermark) {
            sync_state.advance_watermark(next)?;
        }
        Ok(report)
    }

    /// Run cycles every `poll_interval` until `stop` trips.
    ///
    /// A failed cycle is logged and the next tick tries again.
    pub async fn run_forever(&self, stop: &StopSignal) {
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.stopped() => break,
            }

            if let Err(e) = self.run_once(stop).await {
                error!(error = %e, "Sync cycle failed");
            }
            if stop.is_stopped() {
                break;
            }
        }
        info!("Sync driver stopped");
    }
}
