use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::jobs::normalizer::{normalize, RawJob};
use crate::models::job::{Job, JobSource};
use crate::sources::{get_json, FetchError, JobFetcher};

pub const REMOTIVE_ENDPOINT: &str = "https://remotive.com/api/remote-jobs";

#[derive(Debug, Deserialize)]
struct RemotiveEnvelope {
    #[serde(default)]
    jobs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RemotiveJob {
    id: u64,
    title: String,
    #[serde(default)]
    company_name: String,
    #[serde(default)]
    candidate_required_location: String,
    #[serde(default)]
    publication_date: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    /// The live API sends `url`; older payloads use `job_url`. Some carry both.
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    job_url: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<String>,
}

impl RemotiveJob {
    /// First non-blank of `url` and `job_url`.
    fn link(&self) -> Option<&str> {
        [self.url.as_deref(), self.job_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|link| !link.is_empty())
    }

    /// Maps the record into the normalizer input; records without a link are unusable.
    fn into_raw(self) -> Option<RawJob> {
        let url = self.link()?.to_string();
        Some(RawJob {
            id: format!("remotive-{}", self.id),
            source: Some(JobSource::Remotive),
            title: self.title,
            company: self.company_name,
            location: self.candidate_required_location,
            remote: false,
            posted_at: self.publication_date,
            category: self.category,
            provider_tags: self.tags,
            extra_keywords: Vec::new(),
            url,
            description: self.description,
        })
    }
}

/// Remote job board API, envelope `{ "jobs": [...] }`.
pub struct RemotiveFetcher {
    endpoint: String,
}

impl RemotiveFetcher {
    pub fn new() -> Self {
        Self::with_endpoint(REMOTIVE_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for RemotiveFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobFetcher for RemotiveFetcher {
    fn name(&self) -> &str {
        "Remotive"
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<Job>, FetchError> {
        let envelope: RemotiveEnvelope = get_json(client, &self.endpoint).await?;
        let total = envelope.jobs.len();

        let jobs: Vec<Job> = envelope
            .jobs
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RemotiveJob>(value) {
                Ok(job) => {
                    let id = job.id;
                    let raw = job.into_raw();
                    if raw.is_none() {
                        debug!("Skipping Remotive record {id} without a link");
                    }
                    raw.map(|raw| normalize(&raw))
                }
                Err(e) => {
                    debug!("Skipping malformed Remotive record: {e}");
                    None
                }
            })
            .collect();

        info!("Remotive: {} of {} records normalized", jobs.len(), total);
        Ok(jobs)
    }
}
