//! Run command implementation

use std::sync::Arc;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use challenge_board::domain::now_ms;
use challenge_board::source::HttpAchievementSource;
use challenge_board::sync::{StopSignal, SyncDriver};

use super::app::App;

/// Run the sync loop and the leaderboard refresher until Ctrl-C
pub async fn run_command(app: &App, json_events: bool) -> Result<()> {
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

    let refresher = {
        let aggregator = app.aggregator();
        let stop = stop.clone();
        let period = app.config.settings.leaderboard_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stop.stopped() => break,
                }
                if let Err(e) = aggregator.recompute_all(now_ms()) {
                    error!(error = %e, "Leaderboard refresh failed");
                }
            }
        })
    };

    info!(
        poll_secs = app.config.settings.poll_interval_secs,
        "Challenge board running, press Ctrl-C to stop"
    );
    driver.run_forever(&stop).await;

    stop.stop();
    if let Err(e) = refresher.await {
        error!(error = %e, "Leaderboard refresher panicked");
    }
    drop(driver);
    if let Some(printer) = printer {
        printer.await?;
    }
    Ok(())
}
