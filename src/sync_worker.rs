// Background refresh: runs a sync every refresh_interval_secs or when one is requested,
// swapping in a new dashboard whenever a fresher snapshot shows up.
// Syncs run one at a time; requests arriving during a sync are coalesced into the next one.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, interval_at};
use tracing::{debug, info, warn};

use crate::dashboard::{self, SharedDashboard};
use crate::error::SourceError;
use crate::sync_poller::{SnapshotFetcher, SyncPoller};

/// Capacity of the manual sync request channel; extra requests while one is queued are dropped.
pub const SYNC_REQUEST_CAPACITY: usize = 1;

/// What one sync pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReport {
    /// Nothing was loaded yet; a full load (with spreadsheet fallback) succeeded.
    Loaded,
    /// A fresher snapshot replaced the dashboard.
    Updated { immediate: bool },
    /// The snapshot timestamp did not change.
    Unchanged,
}

/// Loader, poller, shared state and control channels for the worker.
pub struct SyncWorkerDeps<L, F> {
    /// Full load used while no dashboard exists yet.
    pub loader: Arc<L>,
    pub poller: Arc<SyncPoller<F>>,
    pub dashboard: SharedDashboard,
    pub request_rx: mpsc::Receiver<()>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct SyncWorkerConfig {
    pub refresh_interval_secs: u64,
}

/// One sync pass against the current dashboard.
pub async fn run_one_sync<L, F>(
    loader: &L,
    poller: &SyncPoller<F>,
    shared: &SharedDashboard,
) -> Result<SyncReport, SourceError>
where
    L: SnapshotFetcher,
    F: SnapshotFetcher,
{
    let loaded = shared.read().await.is_some();
    if !loaded {
        let snapshot = loader.fetch_snapshot().await?;
        dashboard::replace(shared, snapshot).await;
        return Ok(SyncReport::Loaded);
    }

    let known = dashboard::current_timestamp(shared).await;
    let outcome = poller.sync(known.as_deref()).await?;
    if outcome.no_update {
        return Ok(SyncReport::Unchanged);
    }
    let immediate = outcome.immediate;
    dashboard::replace(shared, outcome.snapshot).await;
    Ok(SyncReport::Updated { immediate })
}

pub fn spawn<L, F>(
    deps: SyncWorkerDeps<L, F>,
    config: SyncWorkerConfig,
) -> tokio::task::JoinHandle<()>
where
    L: SnapshotFetcher + Send + Sync + 'static,
    F: SnapshotFetcher + Send + Sync + 'static,
{
    let SyncWorkerDeps {
        loader,
        poller,
        dashboard,
        mut request_rx,
        mut shutdown_rx,
    } = deps;
    let period = Duration::from_secs(config.refresh_interval_secs);

    tokio::spawn(async move {
        let mut tick = interval_at(Instant::now() + period, period);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut requests_open = true;

        loop {
            let trigger = tokio::select! {
                _ = tick.tick() => "interval",
                request = request_rx.recv(), if requests_open => {
                    if request.is_none() {
                        requests_open = false;
                        continue;
                    }
                    "request"
                }
                _ = &mut shutdown_rx => {
                    debug!("sync worker shutting down");
                    break;
                }
            };

            match run_one_sync(loader.as_ref(), poller.as_ref(), &dashboard).await {
                Ok(SyncReport::Unchanged) => debug!(trigger, "sync: snapshot unchanged"),
                Ok(report) => info!(trigger, ?report, "sync: dashboard refreshed"),
                Err(e) => warn!(trigger, error = %e, operation = "sync", "sync failed"),
            }
        }
    })
}
