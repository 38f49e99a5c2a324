//! Time-based retention for the managed output directory.
//!
//! Every [`DEFAULT_SWEEP_INTERVAL`] the sweeper deletes regular files whose
//! modification time is older than the retention window. Per-file errors are
//! logged and skipped; a failed cycle never stops later ones.
//!
//! The sweeper does not coordinate with running downloads. The retention
//! window is much longer than any job, so a file still being written is
//! never old enough to be collected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::observability::Metrics;

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(600);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Outcome of one sweep cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepStats {
    pub scanned: usize,
    pub removed: usize,
    pub errors: usize,
}

#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    dir: PathBuf,
    max_age: Duration,
    interval: Duration,
    metrics: Arc<Metrics>,
}

impl RetentionSweeper {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration, interval: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            dir: dir.into(),
            max_age,
            interval,
            metrics,
        }
    }

    /// Run one cycle against the current clock.
    pub fn sweep_once(&self) -> SweepStats {
        self.sweep_at(SystemTime::now())
    }

    /// Run one cycle as if the clock read `now`.
    pub fn sweep_at(&self, now: SystemTime) -> SweepStats {
        self.sweep_with(now, |path| fs::remove_file(path))
    }

    /// One cycle with a custom removal step. A failed removal is counted and
    /// the sweep moves on to the next entry.
    fn sweep_with<F>(&self, now: SystemTime, remove: F) -> SweepStats
    where
        F: Fn(&Path) -> io::Result<()>,
    {
        let mut stats = SweepStats::default();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Retention sweep could not list directory");
                stats.errors += 1;
                return stats;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable directory entry");
                    stats.errors += 1;
                    continue;
                }
            };
            stats.scanned += 1;

            let path = entry.path();
            let modified = match entry.metadata().and_then(|meta| {
                if meta.is_file() {
                    meta.modified().map(Some)
                } else {
                    Ok(None)
                }
            }) {
                Ok(Some(modified)) => modified,
                Ok(None) => continue,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping file");
                    stats.errors += 1;
                    continue;
                }
            };

            // Files stamped in the future have age zero.
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= self.max_age {
                continue;
            }

            match remove(&path) {
                Ok(()) => {
                    info!(path = %path.display(), age_secs = age.as_secs(), "Cleaned up old file");
                    stats.removed += 1;
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Failed to remove old file");
                    stats.errors += 1;
                }
            }
        }

        self.metrics.files_swept(stats.removed as u64);
        stats
    }

    /// Run a sweep every interval until `cancel` fires. The first sweep
    /// happens one interval after start.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + self.interval;
            let mut interval = tokio::time::interval_at(start, self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let sweeper = self.clone();
                        match tokio::task::spawn_blocking(move || sweeper.sweep_once()).await {
                            Ok(stats) => debug!(?stats, "Retention sweep finished"),
                            Err(e) => warn!(error = %e, "Retention sweep aborted"),
                        }
                    }
                    _ = cancel.cancelled() => {
                        info!("Retention sweeper stopped");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn sweeper(dir: &TempDir) -> RetentionSweeper {
        RetentionSweeper::new(
            dir.path(),
            DEFAULT_RETENTION,
            DEFAULT_SWEEP_INTERVAL,
            Arc::new(Metrics::new()),
        )
    }

    fn file_aged(dir: &TempDir, name: &str, age: Duration) -> PathBuf {
        let path = dir.path().join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[test]
    fn test_removes_file_past_retention() {
        let temp = TempDir::new().unwrap();
        let old = file_aged(&temp, "old.mp4", Duration::from_secs(601));

        let stats = sweeper(&temp).sweep_once();

        assert!(!old.exists());
        assert_eq!(stats.removed, 1);
    }

    #[test]
    fn test_keeps_file_within_retention() {
        let temp = TempDir::new().unwrap();
        let fresh = file_aged(&temp, "fresh.mp4", Duration::from_secs(599));

        let stats = sweeper(&temp).sweep_once();

        assert!(fresh.exists());
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.scanned, 1);
    }

    #[test]
    fn test_sweep_at_injected_clock() {
        let temp = TempDir::new().unwrap();
        let path = file_aged(&temp, "clip.mp4", Duration::ZERO);
        let sweeper = sweeper(&temp);

        sweeper.sweep_at(SystemTime::now() + Duration::from_secs(300));
        assert!(path.exists());

        sweeper.sweep_at(SystemTime::now() + Duration::from_secs(700));
        assert!(!path.exists());
    }

    #[test]
    fn test_directories_are_left_alone() {
        let temp = TempDir::new().unwrap();
        let sub = temp.path().join("nested");
        fs::create_dir(&sub).unwrap();

        sweeper(&temp).sweep_at(SystemTime::now() + Duration::from_secs(3600));
        assert!(sub.is_dir());
    }

    #[test]
    fn test_missing_directory_does_not_panic() {
        let temp = TempDir::new().unwrap();
        let sweeper = RetentionSweeper::new(
            temp.path().join("missing"),
            DEFAULT_RETENTION,
            DEFAULT_SWEEP_INTERVAL,
            Arc::new(Metrics::new()),
        );

        let stats = sweeper.sweep_once();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.removed, 0);
    }

    #[test]
    fn test_failed_removal_does_not_stop_sweep() {
        let temp = TempDir::new().unwrap();
        let a = file_aged(&temp, "a.mp4", Duration::from_secs(1000));
        let locked = file_aged(&temp, "locked.mp4", Duration::from_secs(1000));
        let c = file_aged(&temp, "c.mp4", Duration::from_secs(1000));

        let stats = sweeper(&temp).sweep_with(SystemTime::now(), |path| {
            if path.ends_with("locked.mp4") {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
            } else {
                fs::remove_file(path)
            }
        });

        assert_eq!(stats.scanned, 3);
        assert_eq!(stats.removed, 2);
        assert_eq!(stats.errors, 1);
        assert!(!a.exists());
        assert!(!c.exists());
        assert!(locked.exists());
    }

    #[test]
    fn test_swept_files_are_counted() {
        let temp = TempDir::new().unwrap();
        let metrics = Arc::new(Metrics::new());
        file_aged(&temp, "a.mp4", Duration::from_secs(1000));
        file_aged(&temp, "b.mp4", Duration::from_secs(1000));
        let sweeper = RetentionSweeper::new(
            temp.path(),
            DEFAULT_RETENTION,
            DEFAULT_SWEEP_INTERVAL,
            Arc::clone(&metrics),
        );

        sweeper.sweep_once();
        assert_eq!(metrics.snapshot().files_swept, 2);
    }

    #[tokio::test]
    async fn test_spawned_sweeper_stops_on_cancel() {
        let temp = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        let handle = RetentionSweeper::new(
            temp.path(),
            DEFAULT_RETENTION,
            Duration::from_millis(10),
            Arc::new(Metrics::new()),
        )
        .spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_spawned_sweeper_runs_periodically() {
        let temp = TempDir::new().unwrap();
        let old = file_aged(&temp, "old.mp4", Duration::from_secs(601));
        let cancel = CancellationToken::new();
        let handle = RetentionSweeper::new(
            temp.path(),
            DEFAULT_RETENTION,
            Duration::from_millis(10),
            Arc::new(Metrics::new()),
        )
        .spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(!old.exists());
    }
}
