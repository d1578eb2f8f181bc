//! Leaderboard command implementation

use anyhow::{bail, Result};
use chrono::DateTime;

use challenge_board::domain::{now_ms, EntryDetail, LeaderboardEntry, LeaderboardScope, LeaderboardSnapshot};

use super::app::App;

/// Print a leaderboard, recomputing it unless `cached` is set
pub async fn leaderboard_command(app: &App, scope: &str, cached: bool, json: bool) -> Result<()> {
    let Some(scope) = LeaderboardScope::from_str(scope) else {
        bail!("Unknown leaderboard scope: {} (expected monthly or yearly)", scope);
    };

    let aggregator = app.aggregator();
    let snapshot = if cached {
        match aggregator.cached(scope)? {
            Some(snapshot) => snapshot,
            None => {
                println!("No cached {} leaderboard yet.", scope);
                return Ok(());
            }
        }
    } else {
        aggregator.recompute(scope, now_ms())?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn print_snapshot(snapshot: &LeaderboardSnapshot) {
    let updated = DateTime::from_timestamp_millis(snapshot.last_update)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string());

    match &snapshot.game_id {
        Some(game) => println!(
            "{} leaderboard {} (game {}), updated {}\n",
            snapshot.scope, snapshot.label, game, updated
        ),
        None => println!("{} leaderboard {}, updated {}\n", snapshot.scope, snapshot.label, updated),
    }

    if snapshot.entries.is_empty() {
        println!("  No entries.");
        return;
    }

    for entry in snapshot.top() {
        println!("  {}", format_entry(entry));
    }
    if !snapshot.rest().is_empty() {
        println!("  ---");
        for entry in snapshot.rest() {
            println!("  {}", format_entry(entry));
        }
    }
}

fn format_entry(entry: &LeaderboardEntry) -> String {
    match &entry.detail {
        EntryDetail::Monthly {
            total_achievements,
            completion_percent,
            tier,
        } => format!(
            "#{:<3} {:<20} {}/{} ({:.1}%) {}",
            entry.rank, entry.username, entry.score, total_achievements, completion_percent, tier
        ),
        EntryDetail::Yearly {
            manual_points,
            mastered,
            beaten,
            participation,
            ..
        } => format!(
            "#{:<3} {:<20} {} pts  (M{} B{} P{}, manual {:+})",
            entry.rank, entry.username, entry.score, mastered, beaten, participation, manual_points
        ),
    }
}
