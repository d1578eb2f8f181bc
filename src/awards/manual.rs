//! Manual point grants outside the challenge tiers

use std::sync::Arc;

use tracing::{info, warn};

use crate::announce::AnnouncementSink;
use crate::domain::{Award, ManualAward, Period};
use crate::error::{SyncError, SyncResult};
use crate::identity::IdentityResolver;
use crate::store::AwardStore;

/// Grants manual awards to registered users
#[derive(Clone)]
pub struct ManualAwards {
    awards: AwardStore,
    identities: Arc<dyn IdentityResolver>,
    sink: Arc<dyn AnnouncementSink>,
}

impl ManualAwards {
    pub fn new(
        awards: AwardStore,
        identities: Arc<dyn IdentityResolver>,
        sink: Arc<dyn AnnouncementSink>,
    ) -> Self {
        Self { awards, identities, sink }
    }

    /// Store a grant of `points` for `period` and announce it.
    ///
    /// The grant is stored under the canonical username; an unregistered
    /// name is a `DataIntegrity` error.
    pub async fn grant(
        &self,
        raw_username: &str,
        points: i64,
        reason: &str,
        grantor: &str,
        period: Period,
    ) -> SyncResult<Award> {
        if points == 0 {
            return Err(SyncError::DataIntegrity("manual award of zero points".to_string()));
        }
        if reason.trim().is_empty() {
            return Err(SyncError::DataIntegrity("manual award without a reason".to_string()));
        }

        let username = self.identities.resolve(raw_username)?.ok_or_else(|| {
            SyncError::DataIntegrity(format!("unregistered user: {raw_username}"))
        })?;

        let manual = ManualAward {
            reason: reason.trim().to_string(),
            grantor: grantor.trim().to_string(),
            points,
        };
        let award = self.awards.insert_manual(&username, period, &manual)?;
        info!(user = %username, points, grantor = %manual.grantor, period = %period, "Manual award stored");

        if let Err(e) = self
            .sink
            .on_manual_points_awarded(&username, points, &manual.reason)
            .await
        {
            warn!(user = %username, error = %e, "Failed to announce manual award");
        }

        Ok(award)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announce::{Announcement, ChannelSink};
    use crate::store::Store;

    #[tokio::test]
    async fn test_grant_resolves_identity_and_announces() {
        let store = Store::in_memory().unwrap();
        store.users().register("PlayerOne").unwrap();
        let (sink, mut rx) = ChannelSink::channel(4);
        let manual = ManualAwards::new(store.awards(), Arc::new(store.users()), Arc::new(sink));

        let award = manual
            .grant("playerone", 2, "Tournament winner", "admin", Period::new(5, 2025))
            .await
            .unwrap();
        assert_eq!(award.username, "PlayerOne");
        assert!(award.is_manual());

        assert_eq!(
            rx.recv().await.unwrap(),
            Announcement::ManualPointsAwarded {
                username: "PlayerOne".to_string(),
                points: 2,
                reason: "Tournament winner".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_grant_rejects_unknown_user_and_zero_points() {
        let store = Store::in_memory().unwrap();
        store.users().register("PlayerOne").unwrap();
        let (sink, _rx) = ChannelSink::channel(4);
        let manual = ManualAwards::new(store.awards(), Arc::new(store.users()), Arc::new(sink));

        let err = manual
            .grant("ghost", 2, "x", "admin", Period::new(5, 2025))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::DataIntegrity(_)));

        let err = manual
            .grant("PlayerOne", 0, "x", "admin", Period::new(5, 2025))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::DataIntegrity(_)));
        assert!(store.awards().list_for_year(2025).unwrap().is_empty());
    }
}
