//! HTTP client for a RetroAchievements-style web API

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{shapes, AchievementSource};
use crate::config::SourceSettings;
use crate::domain::{GameProgress, UnlockedAchievement};
use crate::error::{SyncError, SyncResult};

const RECENT_ENDPOINT: &str = "API_GetUserRecentAchievements.php";
const PROGRESS_ENDPOINT: &str = "API_GetGameInfoAndUserProgress.php";

/// Achievement source backed by the service's JSON endpoints.
///
/// `ureq` is blocking, so each request runs on the blocking pool.
#[derive(Clone)]
pub struct HttpAchievementSource {
    base_url: String,
    api_user: String,
    api_key: String,
    recent_limit: usize,
    client: ureq::Agent,
}

impl HttpAchievementSource {
    pub fn new(settings: &SourceSettings) -> anyhow::Result<Self> {
        let api_key = settings.resolved_api_key().ok_or_else(|| {
            anyhow::anyhow!(
                "No API key configured. Set source.api_key or {}",
                SourceSettings::API_KEY_ENV
            )
        })?;

        let client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(settings.timeout_secs))
            .build();

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_user: settings.api_user.clone(),
            api_key,
            recent_limit: settings.recent_limit,
            client,
        })
    }

    async fn get_json(&self, endpoint: &'static str, params: Vec<(&'static str, String)>) -> SyncResult<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let client = self.client.clone();
        let api_user = self.api_user.clone();
        let api_key = self.api_key.clone();

        tokio::task::spawn_blocking(move || {
            let mut req = client.get(&url).query("z", &api_user).query("y", &api_key);
            for (name, value) in &params {
                req = req.query(name, value);
            }

            let resp = req.call().map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    let body = resp.into_string().unwrap_or_default();
                    status_error(endpoint, code, body.trim())
                }
                other => SyncError::TransientFetch(format!("{endpoint}: {other}")),
            })?;

            resp.into_json::<Value>()
                .map_err(|e| SyncError::MalformedPayload(format!("{endpoint} body is not JSON: {e}")))
        })
        .await
        .map_err(|e| SyncError::TransientFetch(format!("request task failed: {e}")))?
    }
}

/// Classify a non-2xx response.
///
/// Rate limiting and server errors are retried next cycle. Any other client
/// error (bad key, unknown user or game) will not fix itself, so it is
/// reported as bad data.
fn status_error(endpoint: &str, code: u16, body: &str) -> SyncError {
    let detail = format!("{endpoint} returned HTTP {code}: {body}");
    match code {
        429 | 500..=599 => SyncError::TransientFetch(detail),
        _ => SyncError::DataIntegrity(detail),
    }
}

#[async_trait]
impl AchievementSource for HttpAchievementSource {
    async fn recent_achievements(
        &self,
        username: &str,
        lookback_minutes: u32,
    ) -> SyncResult<Vec<UnlockedAchievement>> {
        let payload = self
            .get_json(
                RECENT_ENDPOINT,
                vec![("u", username.to_string()), ("m", lookback_minutes.to_string())],
            )
            .await?;

        let mut unlocks = shapes::normalize_recent(payload)?;
        // Newest first, bounded
        unlocks.sort_by(|a, b| b.unlocked_at.cmp(&a.unlocked_at));
        unlocks.truncate(self.recent_limit);
        debug!(user = username, count = unlocks.len(), lookback_minutes, "Fetched recent achievements");
        Ok(unlocks)
    }

    async fn game_progress(&self, username: &str, game_id: &str) -> SyncResult<GameProgress> {
        let payload = self
            .get_json(
                PROGRESS_ENDPOINT,
                vec![("u", username.to_string()), ("g", game_id.to_string())],
            )
            .await?;
        shapes::normalize_progress(&payload)
    }
}
