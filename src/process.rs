use std::sync::Arc;

use chrono::Local;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::batch::{chunk_ids, BatchSummary, FetchOutcome, RunReport};
use crate::request::AssetFetcher;
use crate::storage::ArtifactDir;
use crate::{info_time, GroupId, Result, CHUNK_SIZE, CONCURRENCY_LIMIT, MAX_ATTEMPTS};

/// Knobs of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Fetches allowed in flight at once.
    pub concurrency: usize,
    /// Ids per batch.
    pub chunk_size: usize,
    /// Attempts per id, the first one included.
    pub max_attempts: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            concurrency: CONCURRENCY_LIMIT,
            chunk_size: CHUNK_SIZE,
            max_attempts: MAX_ATTEMPTS,
        }
    }
}

/// Downloads one artifact per id into an [`ArtifactDir`], batch by batch.
///
/// All fetches share one semaphore, so the concurrency cap holds for the whole
/// fetcher and not per call. Clones share it as well.
#[derive(Clone)]
pub struct BatchFetcher {
    fetcher: Arc<dyn AssetFetcher>,
    dir: ArtifactDir,
    permits: Arc<Semaphore>,
    settings: FetchSettings,
}

impl BatchFetcher {
    pub fn new(fetcher: Arc<dyn AssetFetcher>, dir: ArtifactDir, settings: FetchSettings) -> Self {
        let settings = FetchSettings {
            concurrency: settings.concurrency.max(1),
            chunk_size: settings.chunk_size.max(1),
            max_attempts: settings.max_attempts.max(1),
        };
        Self {
            fetcher,
            dir,
            permits: Arc::new(Semaphore::new(settings.concurrency)),
            settings,
        }
    }

    pub fn dir(&self) -> &ArtifactDir {
        &self.dir
    }

    /// Processes all `ids`, one batch after another.
    /// Never fails because of a single id, those end up as failed outcomes in the report.
    pub async fn run(&self, ids: &[GroupId]) -> Result<RunReport> {
        let start_time = Local::now();
        self.dir.ensure().await?;

        let batches = chunk_ids(ids, self.settings.chunk_size);
        let mut report = RunReport::default();
        info_time!(
            "Started fetching {} ids in {} batches",
            ids.len(),
            batches.len()
        );

        for (index, batch) in batches.iter().enumerate() {
            info!("Processing batch {}/{}", index + 1, batches.len());
            let outcomes = self.dispatch_batch(batch).await;
            let summary = BatchSummary::from_outcomes(index, &outcomes);
            info!(
                "Batch {}: {} ok ({} skipped), {} failed",
                index + 1,
                summary.succeeded,
                summary.skipped,
                summary.failed
            );
            report.batches.push(summary);
            report.outcomes.extend(outcomes);
        }

        info_time!(
            start_time,
            "Finished fetching: {} ok, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    /// Fetches every id of `batch` under the shared permit limit and waits for all of them.
    /// Returns one outcome per id, in the order of `batch`.
    pub async fn dispatch_batch(&self, batch: &[GroupId]) -> Vec<FetchOutcome> {
        let handles: Vec<(GroupId, JoinHandle<FetchOutcome>)> = batch
            .iter()
            .map(|&id| {
                let this = self.clone();
                let handle = tokio::spawn(async move {
                    // The semaphore is never closed.
                    let Ok(_permit) = this.permits.acquire().await else {
                        return FetchOutcome::failed(id, "concurrency limiter closed");
                    };
                    this.fetch_with_retry(id).await
                });
                (id, handle)
            })
            .collect();

        // Handles run concurrently, awaiting them in spawn order keeps input order.
        let mut outcomes = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!("Fetch task for {id} died: {err}");
                    FetchOutcome::failed(id, err.to_string())
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Skips ids that already have an artifact, otherwise tries up to `max_attempts` times.
    pub async fn fetch_with_retry(&self, id: GroupId) -> FetchOutcome {
        match self.dir.exists(id).await {
            Ok(true) => {
                info!("Already exists: {}", self.dir.file_name(id));
                return FetchOutcome::skipped(id);
            }
            Ok(false) => {}
            Err(err) => {
                error!("Failed: {id} ({err})");
                return FetchOutcome::failed(id, err.to_string());
            }
        }

        let max_attempts = self.settings.max_attempts;
        let mut attempt = 1;
        loop {
            match self.attempt(id).await {
                Ok(()) => {
                    info!("Downloaded: {}", self.dir.file_name(id));
                    return FetchOutcome::fetched(id);
                }
                Err(err) if attempt < max_attempts => {
                    warn!("Retry {attempt} for {id}: {err}");
                    attempt += 1;
                }
                Err(err) => {
                    error!("Failed: {id} ({err})");
                    return FetchOutcome::failed(id, err.to_string());
                }
            }
        }
    }

    /// One fetch into a fresh part file, committed on success and removed otherwise.
    /// Another task may have committed the same id meanwhile, its file is kept.
    async fn attempt(&self, id: GroupId) -> Result<()> {
        let part = self.dir.part_path(id);
        let committed = match self.fetcher.fetch(id, &part).await {
            Ok(()) => self.dir.commit(&part, id).await,
            Err(err) => Err(err),
        };
        match committed {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!("{} appeared meanwhile, kept it", self.dir.file_name(id));
                Ok(())
            }
            Err(err) => {
                if let Err(cleanup) = self.dir.discard(&part).await {
                    warn!("Couldn't remove {}: {cleanup}", part.display());
                }
                Err(err)
            }
        }
    }
}
