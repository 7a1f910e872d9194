//! Background reload of a settings file
//!
//! The reloader polls the file's CRC32C and reloads the settings only when
//! the checksum changes. An unreadable file has no checksum; once it
//! becomes readable again the checksum differs and the file is reloaded.

use crate::settings::Settings;
use pipedb_sync::{ManagedTask, TaskSignal, Worker};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default interval between two checksum polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

struct ReloadWorker {
    settings: Arc<Settings>,
    interval: Duration,
    reloads: AtomicU64,
}

impl Worker for ReloadWorker {
    fn name(&self) -> &str {
        "settings-reloader"
    }

    fn run(&self, signal: &TaskSignal) {
        let mut last_checksum = None;
        while signal.started() {
            let checksum = self.settings.checksum();
            if checksum != last_checksum && checksum.is_some() {
                match self.settings.load() {
                    Ok(()) => {
                        self.reloads.fetch_add(1, Ordering::SeqCst);
                        info!(path = %self.settings.path().display(), "settings reloaded");
                    }
                    Err(e) => {
                        warn!(path = %self.settings.path().display(), "settings reload failed: {}", e);
                    }
                }
            } else if checksum.is_none() {
                debug!(path = %self.settings.path().display(), "settings file unreadable");
            }
            last_checksum = checksum;
            signal.pause(self.interval);
        }
    }
}

/// Settings kept in sync with their file by a background task
pub struct SettingsReloader {
    task: ManagedTask<ReloadWorker>,
}

impl SettingsReloader {
    /// Reloader for the file at `path`, polling every [`DEFAULT_POLL_INTERVAL`]
    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self::with_interval(path, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            task: ManagedTask::new(ReloadWorker {
                settings: Settings::create(path),
                interval,
                reloads: AtomicU64::new(0),
            }),
        }
    }

    /// Start polling. Returns false if the reloader already ran.
    pub fn start(&self) -> bool {
        self.task.start()
    }

    /// Stop polling; waits up to one polling interval for the worker.
    pub fn stop(&self) {
        self.task.stop();
    }

    pub fn started(&self) -> bool {
        self.task.started()
    }

    pub fn stopped(&self) -> bool {
        self.task.stopped()
    }

    /// The settings being kept in sync
    pub fn settings(&self) -> Arc<Settings> {
        Arc::clone(&self.task.worker().settings)
    }

    /// Number of successful reloads
    pub fn reload_count(&self) -> u64 {
        self.task.worker().reloads.load(Ordering::SeqCst)
    }

    pub fn interval(&self) -> Duration {
        self.task.worker().interval
    }
}
