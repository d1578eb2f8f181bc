//! Yearly board: points over every award of the year

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::warn;

use super::ranking::{rank, Scored};
use crate::config::PointTable;
use crate::domain::{Award, AwardTier, EntryDetail, LeaderboardEntry, Period, User};
use crate::error::SyncResult;
use crate::identity::IdentityResolver;

#[derive(Debug, Default)]
struct Tally {
    /// Best tier per (game, period); duplicates count once
    tiers: BTreeMap<(String, Period), AwardTier>,
    manual_points: i64,
}

/// Rank active users by challenge points plus manual points.
///
/// Only `active_users` appear. Users whose total is not positive are left
/// out.
pub fn yearly_entries(
    awards: &[Award],
    active_users: &[User],
    identities: &dyn IdentityResolver,
    points: &PointTable,
) -> SyncResult<Vec<LeaderboardEntry>> {
    let active: HashSet<&str> = active_users.iter().map(|u| u.username.as_str()).collect();
    let mut tallies: HashMap<String, Tally> = HashMap::new();

    for award in awards {
        let Some(canonical) = identities.resolve(&award.username)? else {
            warn!(user = %award.username, game = %award.game_id, "Skipping award of unregistered user");
            continue;
        };
        if !active.contains(canonical.as_str()) {
            continue;
        }

        let tally = tallies.entry(canonical).or_default();
        match &award.manual {
            Some(manual) => tally.manual_points += manual.points,
            None => {
                let tier = tally
                    .tiers
                    .entry((award.game_id.clone(), award.period))
                    .or_default();
                *tier = (*tier).max(award.tier);
            }
        }
    }

    let rows = tallies
        .into_iter()
        .filter_map(|(username, tally)| {
            let mut challenge_points = 0u64;
            let (mut mastered, mut beaten, mut participation) = (0u32, 0u32, 0u32);
            for tier in tally.tiers.values() {
                challenge_points += points.points_for(*tier);
                match tier {
                    AwardTier::Mastered => mastered += 1,
                    AwardTier::Beaten => beaten += 1,
                    AwardTier::Participation => participation += 1,
                    AwardTier::None => {}
                }
            }

            let total = i64::try_from(challenge_points).unwrap_or(i64::MAX).saturating_add(tally.manual_points);
            (total > 0).then(|| Scored {
                username,
                score: total as u64,
                detail: EntryDetail::Yearly {
                    challenge_points,
                    manual_points: tally.manual_points,
                    mastered,
                    beaten,
                    participation,
                },
            })
        })
        .collect();

    Ok(rank(rows))
}
