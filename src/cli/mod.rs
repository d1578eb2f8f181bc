//! CLI command implementations

pub mod app;
pub mod grant;
pub mod init;
pub mod leaderboard;
pub mod register;
pub mod run;
pub mod sync;

use std::sync::Arc;

use tokio::task::JoinHandle;

use challenge_board::announce::{AnnouncementSink, ChannelSink, FanoutSink, TracingSink};
use challenge_board::sync::StopSignal;

/// Sinks for a sync run: always the log, plus JSON lines on stdout with
/// `json_events`.
///
/// The returned printer task ends once every clone of the sink is dropped.
pub fn announcement_sink(json_events: bool) -> (Arc<dyn AnnouncementSink>, Option<JoinHandle<()>>) {
    let mut fanout = FanoutSink::default();
    fanout.push(Arc::new(TracingSink));

    let printer = json_events.then(|| {
        let (channel, mut rx) = ChannelSink::channel(64);
        fanout.push(Arc::new(channel));
        tokio::spawn(async move {
            while let Some(announcement) = rx.recv().await {
                match serde_json::to_string(&announcement) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "Failed to encode announcement"),
                }
            }
        })
    });

    (Arc::new(fanout), printer)
}

/// Trip `stop` on the first Ctrl-C
pub fn stop_on_ctrl_c(stop: &StopSignal) {
    let stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, stopping after the current user");
            stop.stop();
        }
    });
}
