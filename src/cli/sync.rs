//! Sync command implementation

use std::sync::Arc;

use anyhow::Result;

use challenge_board::domain::now_ms;
use challenge_board::source::HttpAchievementSource;
use challenge_board::sync::{StopSignal, SyncDriver};

use super::app::App;

/// Run a single sync cycle, then refresh both leaderboards
pub async fn sync_command(app: &App, json_events: bool) -> Result<()> {
    let source = HttpAchievementSource::new(&app.config.source)?;
    let (sink, printer) = super::announcement_sink(json_events);
    let driver = SyncDriver::new(
        app.store.clone(),
        Arc::new(source),
        sink,
        app.config.settings.sync_settings(),
    );

    let stop = StopSignal::new();
    super::stop_on_ctrl_c(&stop);

    let report = driver.run_once(&stop).await;
    drop(driver);
    if let Some(printer) = printer {
        printer.await?;
    }
    let report = report?;

    println!(
        "Synced {}/{} users: {} new unlocks, {} award upgrades",
        report.users.len(),
        report.users_total,
        report.new_unlocks(),
        report.upgrades()
    );
    for (user, error) in &report.failures {
        println!("  {} failed: {}", user, error);
    }
    if report.stopped {
        println!("Stopped before all users were processed; watermark not advanced.");
    }

    app.aggregator().recompute_all(now_ms())?;
    Ok(())
}
