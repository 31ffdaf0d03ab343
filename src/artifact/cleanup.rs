use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::config::CleanupConfig;
use crate::error::{Result, BibleDbError};

/// Suffixes SQLite uses for files that sit next to a store
pub const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// Removes transient files, retrying while the OS still holds them
///
/// Callers must drop every connection and stream on a path before running
/// cleanup; the retry only covers handles the OS releases late.
#[derive(Debug, Clone)]
pub struct CleanupManager {
    paths: Vec<PathBuf>,
    max_attempts: u32,
    base_delay: Duration,
}

impl CleanupManager {
    pub fn new(paths: Vec<PathBuf>, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            paths,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Manager for a working store and its SQLite sidecar files
    pub fn for_store(store: &Path, config: &CleanupConfig) -> Self {
        let mut paths = vec![store.to_path_buf()];
        paths.extend(SIDECAR_SUFFIXES.iter().map(|suffix| sidecar_path(store, suffix)));
        Self::new(paths, config.max_attempts, config.base_delay())
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove every path, returning how many files existed and were deleted
    ///
    /// Missing files are not an error. A file that cannot be removed within
    /// `max_attempts` fails the whole cleanup.
    pub async fn run(&self) -> Result<usize> {
        let mut removed = 0;
        for path in &self.paths {
            if self.remove_with_retry(path).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            log::info!("Cleaned up {} transient file(s)", removed);
        }
        Ok(removed)
    }

    async fn remove_with_retry(&self, path: &Path) -> Result<bool> {
        let mut attempt = 1;
        loop {
            match std::fs::remove_file(path) {
                Ok(()) => {
                    log::debug!("Removed {}", path.display());
                    return Ok(true);
                }
                // Gone after a failed attempt means the holder let go and someone removed it
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(attempt > 1),
                Err(e) if attempt >= self.max_attempts => {
                    log::error!(
                        "Giving up on {} after {} attempts: {}",
                        path.display(),
                        attempt,
                        e
                    );
                    return Err(BibleDbError::Cleanup {
                        path: path.to_path_buf(),
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    let delay = backoff_delay(self.base_delay, attempt);
                    log::warn!(
                        "Attempt {}/{} to remove {} failed ({}), retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        path.display(),
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// `<store><suffix>`, e.g. `bible.db.tmp-wal`
pub fn sidecar_path(store: &Path, suffix: &str) -> PathBuf {
    let mut name = store.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Delay before retry number `attempt + 1`: base, 2x base, 4x base, ...
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
}
