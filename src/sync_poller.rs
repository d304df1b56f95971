// Detects a fresher snapshot by comparing its embedded `ultima_atualizacao`.
// Fixed schedule: up to max_attempts checks, each after check_interval. No backoff, no jitter,
// no cancellation once a wait has started.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use tracing::{debug, info, instrument};
use url::Url;

use crate::data_source::{fetch_text, snapshot_from_document};
use crate::error::SourceError;
use crate::models::{ColumnMap, Snapshot, SnapshotDocument, SnapshotOrigin};

/// Delay before each polling attempt.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(2);
/// Polling attempts per wait (≈ 10 s with [`CHECK_INTERVAL`]).
pub const MAX_ATTEMPTS: u32 = 5;

/// Anything that can produce a snapshot on demand.
pub trait SnapshotFetcher {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<Snapshot, SourceError>> + Send;
}

/// Fetches the snapshot document with a `t={epoch_millis}` query parameter and no-cache
/// headers, so neither the browser-side nor intermediate caches answer.
pub struct CacheBustingFetcher {
    client: Client,
    url: Url,
    columns: ColumnMap,
}

impl CacheBustingFetcher {
    pub fn new(client: Client, url: Url, columns: ColumnMap) -> Self {
        Self {
            client,
            url,
            columns,
        }
    }

    /// Snapshot URL with the cache-busting parameter for `epoch_millis`.
    pub fn request_url(&self, epoch_millis: i64) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("t", &epoch_millis.to_string());
        url
    }
}

impl SnapshotFetcher for CacheBustingFetcher {
    async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError> {
        let url = self.request_url(chrono::Utc::now().timestamp_millis());
        let request = self
            .client
            .get(url.clone())
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache");
        let body = fetch_text(request, &url).await?;
        let document: SnapshotDocument = serde_json::from_str(&body)?;
        Ok(snapshot_from_document(
            document,
            &self.columns,
            SnapshotOrigin::Json,
        ))
    }
}

/// Result of a single check.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCheck {
    pub has_update: bool,
    pub snapshot: Snapshot,
}

/// Result of [`SyncPoller::wait_for_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Updated { snapshot: Snapshot, attempts: u32 },
    NotFound,
}

/// Result of [`SyncPoller::sync`]. The snapshot is always usable; the flags tell whether it is new.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub snapshot: Snapshot,
    /// The first fetch already carried a new timestamp.
    pub immediate: bool,
    /// No change was seen during the whole wait; `snapshot` is the latest unchanged data.
    pub no_update: bool,
}

/// True when `snapshot` carries a timestamp different from `known`.
pub fn is_newer(snapshot: &Snapshot, known: Option<&str>) -> bool {
    match snapshot.last_update() {
        Some(ts) => Some(ts) != known,
        None => false,
    }
}

pub struct SyncPoller<F> {
    fetcher: F,
    check_interval: Duration,
    max_attempts: u32,
}

impl<F: SnapshotFetcher> SyncPoller<F> {
    /// Poller with the standard schedule ([`CHECK_INTERVAL`] × [`MAX_ATTEMPTS`]).
    pub fn new(fetcher: F) -> Self {
        Self::with_schedule(fetcher, CHECK_INTERVAL, MAX_ATTEMPTS)
    }

    pub fn with_schedule(fetcher: F, check_interval: Duration, max_attempts: u32) -> Self {
        Self {
            fetcher,
            check_interval,
            max_attempts,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// One fetch, compared against `known`.
    pub async fn check_for_updates(
        &self,
        known: Option<&str>,
    ) -> Result<UpdateCheck, SourceError> {
        let snapshot = self.fetcher.fetch_snapshot().await?;
        Ok(UpdateCheck {
            has_update: is_newer(&snapshot, known),
            snapshot,
        })
    }

    /// Polls until a new timestamp shows up or the attempts run out. Each attempt waits
    /// `check_interval` first. A failed attempt counts as "no update" and the loop goes on.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub async fn wait_for_update(&self, known: Option<&str>) -> WaitOutcome {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.check_interval).await;
            match self.check_for_updates(known).await {
                Ok(check) if check.has_update => {
                    info!(attempt, "updated snapshot found");
                    return WaitOutcome::Updated {
                        snapshot: check.snapshot,
                        attempts: attempt,
                    };
                }
                Ok(_) => debug!(attempt, "no update yet"),
                Err(e) => debug!(attempt, error = %e, "update check failed"),
            }
        }
        info!("no update detected during wait");
        WaitOutcome::NotFound
    }

    /// Immediate fetch, then [`wait_for_update`](Self::wait_for_update) if nothing changed.
    /// Errors from the immediate fetch propagate; when no change ever shows up the
    /// immediately fetched snapshot is returned with `no_update` set.
    #[instrument(skip(self))]
    pub async fn sync(&self, known: Option<&str>) -> Result<SyncOutcome, SourceError> {
        let first = self.check_for_updates(known).await?;
        if first.has_update {
            info!("updated snapshot found immediately");
            return Ok(SyncOutcome {
                snapshot: first.snapshot,
                immediate: true,
                no_update: false,
            });
        }
        debug!("waiting for spreadsheet sync");
        match self.wait_for_update(known).await {
            WaitOutcome::Updated { snapshot, .. } => Ok(SyncOutcome {
                snapshot,
                immediate: false,
                no_update: false,
            }),
            WaitOutcome::NotFound => Ok(SyncOutcome {
                snapshot: first.snapshot,
                immediate: false,
                no_update: true,
            }),
        }
    }
}
