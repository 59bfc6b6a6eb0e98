use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::{error, info};

use crate::parse::pretty_listing;
use crate::session::SessionMinter;
use crate::storage::ArtifactDir;
use crate::{info_time, GroupId, Result, RESULTS_PER_PAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrapeReport {
    pub total: usize,
    pub saved: usize,
    pub failed: usize,
    /// Wall time of the whole run, session minting included.
    pub elapsed: Duration,
}

/// Fetches the job listings of each group from the portal search API, one group at a time,
/// and stores them as `<group_id>.json`.
#[derive(Clone)]
pub struct JobScraper {
    client: Client,
    minter: Arc<dyn SessionMinter>,
    api_url: String,
    dir: ArtifactDir,
    results_per_page: u32,
}

impl JobScraper {
    pub fn new(
        minter: Arc<dyn SessionMinter>,
        api_url: impl Into<String>,
        dir: ArtifactDir,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            minter,
            api_url: api_url.into(),
            dir,
            results_per_page: RESULTS_PER_PAGE,
        })
    }

    pub fn with_results_per_page(mut self, results_per_page: u32) -> Self {
        self.results_per_page = results_per_page;
        self
    }

    pub fn dir(&self) -> &ArtifactDir {
        &self.dir
    }

    /// Scrapes every group in order. A group that fails is logged and counted, never fatal.
    /// Existing files are overwritten.
    pub async fn scrape_all(&self, ids: &[GroupId]) -> Result<ScrapeReport> {
        let start_time = Local::now();
        self.dir.ensure().await?;
        let mut report = ScrapeReport {
            total: ids.len(),
            ..ScrapeReport::default()
        };
        info_time!("Starting scraping for total groups: {}", ids.len());

        let headers = match self.minter.mint().await {
            Ok(headers) => headers,
            Err(err) => {
                error!("Couldn't mint a portal session, skipping all groups: {err}");
                report.failed = ids.len();
                report.elapsed = elapsed_since(start_time);
                return Ok(report);
            }
        };

        for &id in ids {
            log_progress(start_time, report.saved + report.failed, ids.len());
            match self.scrape_group(id, &headers).await {
                Ok(()) => {
                    info!("Saved {}", self.dir.artifact_path(id).display());
                    report.saved += 1;
                }
                Err(err) => {
                    error!("Error scraping {id}: {err}");
                    report.failed += 1;
                }
            }
        }

        report.elapsed = elapsed_since(start_time);
        info_time!(
            start_time,
            "Scraping complete for all {} groups: {} saved, {} failed",
            report.total,
            report.saved,
            report.failed
        );
        Ok(report)
    }

    pub fn search_url(&self, id: GroupId) -> String {
        format!(
            "{}?noOfResults={}&groupId={id}&pageNo=1&searchType=groupidsearch",
            self.api_url, self.results_per_page
        )
    }

    async fn scrape_group(&self, id: GroupId, headers: &HeaderMap) -> Result<()> {
        let res = self
            .client
            .get(self.search_url(id))
            .headers(headers.clone())
            .send()
            .await?
            .error_for_status()?;
        let body = res.bytes().await?;
        let pretty = pretty_listing(body.to_vec()).await?;
        self.dir.write(id, &pretty).await?;
        Ok(())
    }
}

fn elapsed_since(start_time: DateTime<Local>) -> Duration {
    (Local::now() - start_time).to_std().unwrap_or_default()
}

/// Done/pending counts plus a naive ETA from the average time per finished group.
fn log_progress(start_time: DateTime<Local>, done: usize, total: usize) {
    let elapsed = (Local::now() - start_time).num_milliseconds() as f64 / 1000.0;
    let pending = total - done;
    if done == 0 {
        info!("Scraping | Done: {done}/{total} | Pending: {pending} | Elapsed: {elapsed:.1}s");
        return;
    }
    let avg = elapsed / done as f64;
    info!(
        "Scraping | Done: {done}/{total} | Pending: {pending} | Elapsed: {elapsed:.1}s | Avg/group: {avg:.2}s | Est. remaining: {:.1}s",
        avg * pending as f64
    );
}
