//! Job service: fetch, rank and cache the job list.
//!
//! This is the outermost recovery boundary. A panic anywhere in a pipeline
//! run is logged and served as an empty list.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::aggregator::Aggregator;
use crate::models::job::Job;
use crate::ranking::JobRanker;

struct CachedJobs {
    jobs: Vec<Job>,
    built_at: Instant,
}

pub struct JobService {
    aggregator: Aggregator,
    ranker: Arc<dyn JobRanker>,
    /// Zero disables caching.
    ttl: Duration,
    cache: RwLock<Option<CachedJobs>>,
    /// Held for the duration of a pipeline run so concurrent callers share one rebuild.
    rebuild: Mutex<()>,
}

impl JobService {
    pub fn new(aggregator: Aggregator, ranker: Arc<dyn JobRanker>, ttl: Duration) -> Self {
        Self {
            aggregator,
            ranker,
            ttl,
            cache: RwLock::new(None),
            rebuild: Mutex::new(()),
        }
    }

    /// Ranked jobs, served from cache while it is younger than the TTL.
    /// Callers arriving during a rebuild wait for it and reuse its result.
    pub async fn jobs(&self) -> Vec<Job> {
        if let Some(jobs) = self.fresh().await {
            return jobs;
        }

        let _rebuild = self.rebuild.lock().await;
        if let Some(jobs) = self.fresh().await {
            debug!("Reusing jobs rebuilt by a concurrent request");
            return jobs;
        }
        self.rebuild_locked().await
    }

    /// Rebuilds the list regardless of cache age.
    pub async fn refresh(&self) -> Vec<Job> {
        let _rebuild = self.rebuild.lock().await;
        self.rebuild_locked().await
    }

    async fn fresh(&self) -> Option<Vec<Job>> {
        if self.ttl.is_zero() {
            return None;
        }
        let cache = self.cache.read().await;
        let cached = cache.as_ref()?;
        if cached.built_at.elapsed() < self.ttl {
            debug!("Serving {} cached jobs", cached.jobs.len());
            Some(cached.jobs.clone())
        } else {
            None
        }
    }

    /// Caller must hold `rebuild`.
    async fn rebuild_locked(&self) -> Vec<Job> {
        let jobs = self.run_guarded().await;

        if !self.ttl.is_zero() && !jobs.is_empty() {
            *self.cache.write().await = Some(CachedJobs {
                jobs: jobs.clone(),
                built_at: Instant::now(),
            });
        }
        jobs
    }

    async fn run_guarded(&self) -> Vec<Job> {
        match AssertUnwindSafe(self.run_pipeline()).catch_unwind().await {
            Ok(jobs) => jobs,
            Err(_) => {
                error!("Job pipeline panicked, serving an empty list");
                Vec::new()
            }
        }
    }

    async fn run_pipeline(&self) -> Vec<Job> {
        let jobs = self.aggregator.collect().await;
        if jobs.is_empty() {
            return jobs;
        }
        let ranked = self.ranker.rank(jobs).await;
        info!("Ranked {} jobs with {} ranker", ranked.len(), self.ranker.backend());
        ranked
    }
}
