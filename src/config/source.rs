use serde::{Deserialize, Serialize};

/// Connection settings for the achievement service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Base URL of the web API, without the endpoint name
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Account the API key belongs to
    #[serde(default)]
    pub api_user: String,

    /// API key; falls back to the `CHALLENGE_BOARD_API_KEY` environment variable
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Most recent unlocks kept per user per fetch
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_base_url() -> String {
    "https://retroachievements.org/API".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_recent_limit() -> usize {
    50
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_user: String::new(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl SourceSettings {
    pub const API_KEY_ENV: &'static str = "CHALLENGE_BOARD_API_KEY";

    /// Configured key, else the environment variable; blank values count as unset
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(Self::API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}
