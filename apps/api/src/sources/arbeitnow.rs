use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::jobs::normalizer::{normalize, RawJob};
use crate::models::job::{Job, JobSource};
use crate::sources::{get_json, FetchError, JobFetcher};

pub const ARBEITNOW_ENDPOINT: &str = "https://www.arbeitnow.com/api/job-board-api";

#[derive(Debug, Deserialize)]
struct ArbeitnowEnvelope {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ArbeitnowJob {
    slug: String,
    title: String,
    #[serde(default)]
    company_name: String,
    #[serde(default)]
    location: String,
    /// Unix seconds in the live API; string dates are tolerated.
    #[serde(default)]
    created_at: Value,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    remote: bool,
    url: String,
}

impl From<ArbeitnowJob> for RawJob {
    fn from(job: ArbeitnowJob) -> Self {
        let posted_at = match job.created_at {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s),
            _ => None,
        };
        let category = job
            .tags
            .first()
            .cloned()
            .unwrap_or_else(|| "General".to_string());

        RawJob {
            id: format!("arbeitnow-{}", job.slug),
            source: Some(JobSource::Arbeitnow),
            title: job.title,
            company: job.company_name,
            location: job.location,
            remote: job.remote,
            posted_at,
            category: Some(category),
            provider_tags: job.tags,
            extra_keywords: Vec::new(),
            url: job.url,
            description: job.description,
        }
    }
}

/// European job board API, envelope `{ "data": [...] }`.
pub struct ArbeitnowFetcher {
    endpoint: String,
}

impl ArbeitnowFetcher {
    pub fn new() -> Self {
        Self::with_endpoint(ARBEITNOW_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for ArbeitnowFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobFetcher for ArbeitnowFetcher {
    fn name(&self) -> &str {
        "Arbeitnow"
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<Job>, FetchError> {
        let envelope: ArbeitnowEnvelope = get_json(client, &self.endpoint).await?;
        let records = envelope.data;
        let total = records.len();
        let jobs: Vec<Job> = records
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<ArbeitnowJob>(value) {
                Ok(job) => Some(normalize(&RawJob::from(job))),
                Err(e) => {
                    debug!("Skipping malformed Arbeitnow record: {e}");
                    None
                }
            })
            .collect();

        info!("Arbeitnow: {} of {} records normalized", jobs.len(), total);
        Ok(jobs)
    }
}
