//! Monthly board: achievement counts on the period's monthly game

use std::collections::HashMap;

use tracing::warn;

use super::ranking::{rank, Scored};
use crate::domain::{Award, EntryDetail, LeaderboardEntry};
use crate::error::SyncResult;
use crate::identity::IdentityResolver;

/// Rank the awards of one monthly game.
///
/// Rows are merged on the canonical username, keeping the higher count.
/// Unregistered names and zero counts are left out.
pub fn monthly_entries(
    awards: &[Award],
    identities: &dyn IdentityResolver,
) -> SyncResult<Vec<LeaderboardEntry>> {
    let mut best: HashMap<String, &Award> = HashMap::new();

    for award in awards.iter().filter(|a| !a.is_manual()) {
        let Some(canonical) = identities.resolve(&award.username)? else {
            warn!(user = %award.username, game = %award.game_id, "Skipping award of unregistered user");
            continue;
        };

        best.entry(canonical)
            .and_modify(|kept| {
                if (award.achievement_count, award.tier) > (kept.achievement_count, kept.tier) {
                    *kept = award;
                }
            })
            .or_insert(award);
    }

    let rows = best
        .into_iter()
        .filter(|(_, award)| award.achievement_count > 0)
        .map(|(username, award)| Scored {
            username,
            score: u64::from(award.achievement_count),
            detail: EntryDetail::Monthly {
                total_achievements: award.total_achievements,
                completion_percent: award.completion_percent,
                tier: award.tier,
            },
        })
        .collect();

    Ok(rank(rows))
}
