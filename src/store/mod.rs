//! Persistence for users, challenges, awards, sync progress and leaderboards
//!
//! Everything lives in one SQLite database (`~/.challenge-board/board.db`).
//!
//! # Usage
//!
//! ```ignore
//! let store = Store::open(&path)?;
//!
//! let canonical = store.users().resolve("playerone")?;
//! let awards = store.awards().list_for_year(2025)?;
//! store.cache().write(&snapshot)?;
//! ```

mod awards;
mod cache;
mod challenges;
mod db;
mod progress;
mod sync_state;
mod users;

pub use awards::{AwardStore, AwardUpdate, StoredAward};
pub use cache::LeaderboardCache;
pub use challenges::ChallengeStore;
pub use db::StoreDb;
pub use progress::ProgressStore;
pub use sync_state::SyncStateStore;
pub use users::UserStore;

use anyhow::Result;

/// Entry point to the individual stores; cheap to clone
#[derive(Clone)]
pub struct Store {
    db: StoreDb,
}

impl Store {
    /// Open (or create) the database at `path`
    pub fn open(path: &std::path::Path) -> Result<Self> {
        Ok(Self {
            db: StoreDb::open(path)?,
        })
    }

    /// Private in-memory database, mostly for tests
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: StoreDb::open_in_memory()?,
        })
    }

    pub fn awards(&self) -> AwardStore {
        AwardStore::new(self.db.clone())
    }

    pub fn progress(&self) -> ProgressStore {
        ProgressStore::new(self.db.clone())
    }

    pub fn users(&self) -> UserStore {
        UserStore::new(self.db.clone())
    }

    pub fn challenges(&self) -> ChallengeStore {
        ChallengeStore::new(self.db.clone())
    }

    pub fn cache(&self) -> LeaderboardCache {
        LeaderboardCache::new(self.db.clone())
    }

    pub fn sync_state(&self) -> SyncStateStore {
        SyncStateStore::new(self.db.clone())
    }
}
