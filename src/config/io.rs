//! Configuration file I/O operations

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.challenge-board/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".challenge-board")
    }

    /// Get the global config file path (~/.challenge-board/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load from `path` if given, else from the global path.
    ///
    /// A missing global file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let global_path = Self::global_config_path();
        if global_path.exists() {
            Self::from_file(&global_path)
        } else {
            tracing::debug!(
                "No config at {}, using defaults (run `challenge-board init`)",
                global_path.display()
            );
            Ok(Self::default())
        }
    }
}

/// What [`write_config`] does when the target already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    Refuse,
    Replace,
}

/// Write a config file while holding the board's config lock.
///
/// The existence check for [`Overwrite::Refuse`] runs under the lock, so two
/// racing `init`s cannot both write. Readers see the old file or the new one,
/// never a partial write. Returns `false` if the write was refused.
pub fn write_config(path: &Path, content: &str, overwrite: Overwrite) -> Result<bool> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

    let lock_path = path.with_extension("lock");
    let lock = File::create(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;
    lock.lock_exclusive()
        .with_context(|| format!("Failed to lock {}", lock_path.display()))?;

    if overwrite == Overwrite::Refuse && path.exists() {
        return Ok(false);
    }

    let staged = path.with_extension("staged");
    let result = stage_and_swap(&staged, path, content);
    if result.is_err() {
        let _ = std::fs::remove_file(&staged);
    }
    result.map(|()| true)
}

fn stage_and_swap(staged: &Path, path: &Path, content: &str) -> Result<()> {
    let mut file = File::create(staged)
        .with_context(|| format!("Failed to stage config: {}", staged.display()))?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    std::fs::rename(staged, path)
        .with_context(|| format!("Failed to replace config: {}", path.display()))
}
