//! Polling sync of achievement unlocks into awards

mod driver;
mod rate_limit;
mod stop;
mod user;

pub use driver::{lookback_minutes, CycleReport, SyncDriver, SyncSettings};
pub use rate_limit::RateLimiter;
pub use stop::StopSignal;
pub use user::UserSyncReport;
