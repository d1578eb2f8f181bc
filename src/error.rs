//! Error taxonomy for sync, award and leaderboard operations

use crate::domain::AwardTier;

/// Errors raised by the core components.
///
/// Callers decide scope from the variant: `TransientFetch` skips a user for
/// the current cycle, `DataIntegrity` and `MalformedPayload` skip a single
/// record, `ConcurrentUpdateConflict` is retried once by the award engine.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Failed to fetch from achievement service: {0}")]
    TransientFetch(String),

    #[error("Missing or rejected record: {0}")]
    DataIntegrity(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Concurrent update on award {0}")]
    ConcurrentUpdateConflict(String),

    #[error("Refusing to lower tier of {key} from {stored} to {requested}")]
    TierRegression {
        key: String,
        stored: AwardTier,
        requested: AwardTier,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether the failure is worth retrying on the next cycle
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFetch(_) | Self::ConcurrentUpdateConflict(_))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
