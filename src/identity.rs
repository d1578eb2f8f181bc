//! Username normalization
//!
//! Usernames reported by the achievement service (or typed by people) may differ
//! in case from the registered spelling. Records are always merged on the
//! resolved canonical name, never on the raw string.

use std::collections::HashMap;

use crate::error::SyncResult;

/// Maps a raw username onto the single registered identity
pub trait IdentityResolver: Send + Sync {
    /// Canonical username, or `None` if nobody is registered under that name
    fn resolve(&self, raw_username: &str) -> SyncResult<Option<String>>;
}

/// Fixed in-memory identity table
#[derive(Debug, Clone, Default)]
pub struct StaticIdentities {
    by_folded: HashMap<String, String>,
}

impl StaticIdentities {
    pub fn new<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut by_folded = HashMap::new();
        for name in usernames {
            let name: String = name.into();
            // First registration wins, like the users table
            by_folded.entry(fold(&name)).or_insert(name);
        }
        Self { by_folded }
    }
}

impl IdentityResolver for StaticIdentities {
    fn resolve(&self, raw_username: &str) -> SyncResult<Option<String>> {
        if raw_username.trim().is_empty() {
            return Ok(None);
        }
        Ok(self.by_folded.get(&fold(raw_username)).cloned())
    }
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}
