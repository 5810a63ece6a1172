//! Refresh Scheduler - periodic dataset replacement
//!
//! Background loop that keeps the snapshot store fresh. Refresh failures
//! are logged and recorded; the previously installed dataset keeps serving.

use crate::application::{DatasetProvider, SnapshotStore};
use crate::domain::errors::{InstallError, RefreshError};
use parking_lot::RwLock;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;

/// Where the scheduler currently is in its tick cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    Idle,
    Fetching,
}

/// Result of one refresh tick.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// New dataset is active under this snapshot version
    Installed { version: u64 },
    /// Fetch or decode failed; previous dataset retained
    FetchFailed(RefreshError),
    /// Dataset decoded but was rejected by the store; previous dataset retained
    InstallFailed(InstallError),
}

impl RefreshOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, RefreshOutcome::Installed { .. })
    }
}

/// Refresh history, exposed by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshStatus {
    pub state: RefreshState,
    /// Unix seconds of the last tick start
    pub last_attempt: Option<u64>,
    /// Unix seconds of the last successful install
    pub last_success: Option<u64>,
    pub consecutive_failures: u32,
    pub total_failures: u64,
    pub last_error: Option<String>,
}

/// Shared, lock-protected refresh status.
#[derive(Debug)]
pub struct RefreshStats {
    inner: RwLock<RefreshStatus>,
}

impl RefreshStats {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RefreshStatus {
                state: RefreshState::Idle,
                last_attempt: None,
                last_success: None,
                consecutive_failures: 0,
                total_failures: 0,
                last_error: None,
            }),
        }
    }

    pub fn snapshot(&self) -> RefreshStatus {
        self.inner.read().clone()
    }

    fn begin(&self) {
        let mut status = self.inner.write();
        status.state = RefreshState::Fetching;
        status.last_attempt = Some(unix_now());
    }

    fn record_success(&self) {
        let mut status = self.inner.write();
        status.state = RefreshState::Idle;
        status.last_success = Some(unix_now());
        status.consecutive_failures = 0;
        status.last_error = None;
    }

    fn record_failure(&self, kind: &str) {
        let mut status = self.inner.write();
        status.state = RefreshState::Idle;
        status.consecutive_failures += 1;
        status.total_failures += 1;
        status.last_error = Some(kind.to_string());
    }
}

impl Default for RefreshStats {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Periodically fetches a new dataset and installs it.
///
/// Ticks never overlap: the loop awaits each refresh before it starts
/// waiting for the next one.
pub struct RefreshScheduler {
    provider: Arc<DatasetProvider>,
    store: Arc<SnapshotStore>,
    stats: Arc<RefreshStats>,
    interval: Duration,
    jitter: Duration,
}

impl RefreshScheduler {
    pub fn new(
        provider: Arc<DatasetProvider>,
        store: Arc<SnapshotStore>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            stats: Arc::new(RefreshStats::new()),
            interval,
            jitter: Duration::ZERO,
        }
    }

    /// Add up to `jitter` of random delay to every tick.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Share an existing status record (e.g. one also held by the API).
    pub fn with_stats(mut self, stats: Arc<RefreshStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> Arc<RefreshStats> {
        Arc::clone(&self.stats)
    }

    /// Delay before the next tick.
    pub fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }
        let extra = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        self.interval + Duration::from_millis(extra)
    }

    /// Run one refresh tick.
    pub async fn refresh_once(&self) -> RefreshOutcome {
        self.stats.begin();

        let dataset = match self.provider.load().await {
            Ok(dataset) => dataset,
            Err(e) => {
                tracing::error!("downloading update failed ({}): {}", e.kind(), e);
                self.stats.record_failure(e.kind());
                return RefreshOutcome::FetchFailed(e);
            }
        };

        match self.store.install(dataset) {
            Ok(version) => {
                tracing::info!(
                    "database reloaded, edition={} version={}",
                    self.provider.edition(),
                    version
                );
                self.stats.record_success();
                RefreshOutcome::Installed { version }
            }
            Err(e) => {
                tracing::error!("reload failed: {}", e);
                self.stats.record_failure("invalid_dataset");
                RefreshOutcome::InstallFailed(e)
            }
        }
    }

    /// Run forever, or until a shutdown signal is received.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            "refresh scheduler started, interval={:?} jitter={:?}",
            self.interval,
            self.jitter
        );

        loop {
            let delay = self.next_delay();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => {
                    tracing::info!("refresh scheduler stopped");
                    return;
                }
            }

            // An interrupted tick installs nothing
            tokio::select! {
                _ = self.refresh_once() => {}
                _ = shutdown.recv() => {
                    tracing::info!("refresh scheduler stopped during refresh");
                    return;
                }
            }
        }
    }

    /// Spawn the loop on the tokio runtime.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
