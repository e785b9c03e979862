/// Periodic purge of dead refresh sessions
///
/// The sweeper wakes every `interval` (first run one interval after start),
/// calls [`SessionStore::delete_expired`] under a timeout, logs the outcome
/// and goes back to sleep. Failures are never fatal. Cancelling the shutdown
/// token stops the loop.
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::auth::session::SessionStore;
/// use taskdesk_shared::auth::sweeper::{SessionSweeper, SweeperConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(sessions: SessionStore) {
/// let shutdown = CancellationToken::new();
/// let handle = SessionSweeper::new(sessions, SweeperConfig::default()).spawn(shutdown.clone());
///
/// // ... serve requests ...
///
/// shutdown.cancel();
/// let _ = handle.await;
/// # }
/// ```

use crate::auth::session::{SessionStore, DEFAULT_REVOKED_RETENTION_DAYS};
use crate::error::{AppError, AppResult};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub const DEFAULT_SWEEP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Time between runs
    pub interval: Duration,

    /// Upper bound for one run
    pub timeout: Duration,

    /// How long revoked sessions are kept
    pub retention: chrono::Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SWEEP_INTERVAL,
            timeout: DEFAULT_SWEEP_TIMEOUT,
            retention: chrono::Duration::days(DEFAULT_REVOKED_RETENTION_DAYS),
        }
    }
}

pub struct SessionSweeper {
    sessions: SessionStore,
    config: SweeperConfig,
}

impl SessionSweeper {
    pub fn new(sessions: SessionStore, config: SweeperConfig) -> Self {
        Self { sessions, config }
    }

    /// One bounded purge, returning the number of deleted sessions
    pub async fn run_once(&self) -> AppResult<u64> {
        tokio::time::timeout(
            self.config.timeout,
            self.sessions.delete_expired(self.config.retention),
        )
        .await
        .map_err(|elapsed| AppError::internal("session sweep timed out", elapsed))?
    }

    /// Runs the sweep loop on a background task until `shutdown` is cancelled
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = self.config.interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(interval_secs = period.as_secs(), "Session sweeper started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Session sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        match self.run_once().await {
                            Ok(deleted) => {
                                tracing::info!(deleted, "Session sweep finished");
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Session sweep failed");
                            }
                        }
                    }
                }
            }
        })
    }
}
