//! Competition ranking ("1224" style)

use crate::domain::{EntryDetail, LeaderboardEntry};

/// Ranks for scores already sorted in descending order.
///
/// Equal scores share a rank and the next distinct score skips ahead by the
/// size of the tie: `[10, 10, 8]` ranks `[1, 1, 3]`.
pub fn competition_ranks(scores: &[u64]) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(scores.len());
    let mut current = 0u32;
    for (i, score) in scores.iter().enumerate() {
        if i == 0 || scores[i - 1] != *score {
            current = i as u32 + 1;
        }
        ranks.push(current);
    }
    ranks
}

/// A scored row before ranking
#[derive(Debug, Clone)]
pub(crate) struct Scored {
    pub username: String,
    pub score: u64,
    pub detail: EntryDetail,
}

/// Sort by score (descending), break display ties by name, then rank
pub(crate) fn rank(mut rows: Vec<Scored>) -> Vec<LeaderboardEntry> {
    rows.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.username.to_lowercase().cmp(&b.username.to_lowercase()))
            .then_with(|| a.username.cmp(&b.username))
    });

    let scores: Vec<u64> = rows.iter().map(|r| r.score).collect();
    rows.into_iter()
        .zip(competition_ranks(&scores))
        .map(|(row, rank)| LeaderboardEntry {
            rank,
            username: row.username,
            score: row.score,
            detail: row.detail,
        })
        .collect()
}
