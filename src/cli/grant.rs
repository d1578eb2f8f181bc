//! Grant command implementation

use std::sync::Arc;

use anyhow::{bail, Result};

use challenge_board::announce::TracingSink;
use challenge_board::awards::ManualAwards;
use challenge_board::domain::{now_ms, LeaderboardScope, Period};

use super::app::App;

/// Grant manual points to a registered user
pub async fn grant_command(
    app: &App,
    username: &str,
    points: i64,
    reason: &str,
    grantor: &str,
    month: Option<String>,
) -> Result<()> {
    let period = match month {
        Some(raw) => parse_month(&raw)?,
        None => Period::current(),
    };

    let manual = ManualAwards::new(
        app.store.awards(),
        Arc::new(app.store.users()),
        Arc::new(TracingSink),
    );
    let award = manual.grant(username, points, reason, grantor, period).await?;

    println!(
        "Granted {:+} points to {} for {} ({})",
        points, award.username, period, award.game_id
    );
    app.aggregator().recompute(LeaderboardScope::Yearly, now_ms())?;
    Ok(())
}

/// Parse "YYYY-MM"
fn parse_month(raw: &str) -> Result<Period> {
    let Some((year, month)) = raw.trim().split_once('-') else {
        bail!("Expected YYYY-MM, got {}", raw);
    };
    let period = Period::new(month.parse()?, year.parse()?);
    if !period.is_valid() {
        bail!("Invalid month: {}", raw);
    }
    Ok(period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2025-04").unwrap(), Period::new(4, 2025));
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("April").is_err());
    }
}
