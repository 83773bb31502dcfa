//! Aggregator: runs every fetcher concurrently and merges the results.
//!
//! Each fetcher runs in its own task under a timeout. A fetcher that errors,
//! times out or panics contributes nothing; the others are unaffected.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::models::job::Job;
use crate::sources::{ArbeitnowFetcher, CareerPageFetcher, JobFetcher, RemotiveFetcher, SiteConfig};

pub struct Aggregator {
    fetchers: Vec<Arc<dyn JobFetcher>>,
    client: Client,
    fetch_timeout: Duration,
}

impl Aggregator {
    pub fn new(fetchers: Vec<Arc<dyn JobFetcher>>, client: Client, fetch_timeout: Duration) -> Self {
        Self {
            fetchers,
            client,
            fetch_timeout,
        }
    }

    /// Both job-board APIs plus one career-page fetcher per site.
    pub fn with_default_apis(sites: Vec<SiteConfig>, client: Client, fetch_timeout: Duration) -> Self {
        let mut fetchers: Vec<Arc<dyn JobFetcher>> =
            vec![Arc::new(RemotiveFetcher::new()), Arc::new(ArbeitnowFetcher::new())];
        fetchers.extend(
            sites
                .into_iter()
                .map(|site| Arc::new(CareerPageFetcher::new(site)) as Arc<dyn JobFetcher>),
        );
        Self::new(fetchers, client, fetch_timeout)
    }

    pub fn fetcher_count(&self) -> usize {
        self.fetchers.len()
    }

    /// Fetches from every provider, waits for all of them to settle and
    /// returns the deduplicated, unranked union.
    pub async fn collect(&self) -> Vec<Job> {
        let tasks = self.fetchers.iter().map(|fetcher| {
            let fetcher = Arc::clone(fetcher);
            let client = self.client.clone();
            let limit = self.fetch_timeout;
            tokio::spawn(async move {
                match tokio::time::timeout(limit, fetcher.fetch(&client)).await {
                    Ok(Ok(jobs)) => jobs,
                    Ok(Err(e)) => {
                        warn!("Source {} failed: {e}", fetcher.name());
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(
                            "Source {} timed out after {}s",
                            fetcher.name(),
                            limit.as_secs_f32()
                        );
                        Vec::new()
                    }
                }
            })
        });

        let settled = join_all(tasks).await;

        let mut merged = Vec::new();
        for result in settled {
            match result {
                Ok(jobs) => merged.extend(jobs),
                Err(e) => error!("Source task aborted: {e}"),
            }
        }

        let fetched = merged.len();
        let unique = dedupe_jobs(merged);
        info!(
            "Aggregated {} jobs ({} before dedupe) from {} sources",
            unique.len(),
            fetched,
            self.fetchers.len()
        );
        unique
    }
}

/// Collapses jobs sharing a dedupe key. The last occurrence wins and takes
/// the position of the first.
pub fn dedupe_jobs(jobs: Vec<Job>) -> Vec<Job> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(jobs.len());
    let mut unique: Vec<Job> = Vec::with_capacity(jobs.len());

    for job in jobs {
        match slots.entry(job.dedupe_key()) {
            Entry::Occupied(slot) => unique[*slot.get()] = job,
            Entry::Vacant(slot) => {
                slot.insert(unique.len());
                unique.push(job);
            }
        }
    }

    unique
}
