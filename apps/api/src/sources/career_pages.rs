//! Career-page scraper: one fetcher per configured site.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::jobs::normalizer::{normalize, RawJob};
use crate::models::job::{Job, JobSource};
use crate::sources::extract::{extract_postings, ScrapedItem, SelectorRules};
use crate::sources::{get_ok, FetchError, JobFetcher};

pub const DEFAULT_SITE_LIMIT: usize = 20;

/// Location assumed for scraped postings that do not state one.
const DEFAULT_SCRAPED_LOCATION: &str = "Tirol";

fn default_limit() -> usize {
    DEFAULT_SITE_LIMIT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub source: JobSource,
    pub urls: Vec<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub selectors: Option<SelectorRules>,
}

impl SiteConfig {
    pub fn new(source: JobSource, url: &str) -> Self {
        Self {
            source,
            urls: vec![url.to_string()],
            limit: DEFAULT_SITE_LIMIT,
            selectors: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SitesFile {
    sites: Vec<SiteConfig>,
}

/// Built-in Tyrolean and Austrian career pages.
pub fn default_sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig::new(JobSource::JobsTt, "https://jobs.tt.com"),
        SiteConfig::new(JobSource::Tirolerjobs, "https://tirolerjobs.at"),
        SiteConfig::new(JobSource::WillkommenTirol, "https://willkommen.tirol"),
        SiteConfig::new(JobSource::OehJobboerse, "https://jobs.oehweb.at"),
        SiteConfig::new(
            JobSource::UniInnsbruck,
            "https://www.uibk.ac.at/de/karriere/stellenangebote/",
        ),
        SiteConfig::new(
            JobSource::MciCareerCenter,
            "https://www.mci4me.at/en/services/career-center/job-portal",
        ),
        SiteConfig::new(JobSource::IndustrieTirol, "https://www.industrie.tirol/karriere/"),
        SiteConfig::new(JobSource::StartupTirol, "https://startup.tirol/ueber-uns/jobs/"),
        SiteConfig::new(
            JobSource::TirolGv,
            "https://www.tirol.gv.at/buergerservice/karriereportal/",
        ),
        SiteConfig::new(
            JobSource::InnsbruckGv,
            "https://www.innsbruck.gv.at/magistrat/personal/offene-stellen",
        ),
        SiteConfig::new(JobSource::Ikb, "https://www.ikb.at/karriere"),
        SiteConfig::new(JobSource::TirolKliniken, "https://karriere.tirol-kliniken.at"),
        SiteConfig::new(JobSource::Ams, "https://www.ams.at/allejobs"),
        SiteConfig::new(JobSource::MetaJob, "https://www.metajob.at"),
        SiteConfig::new(JobSource::KarriereAt, "https://www.karriere.at"),
        SiteConfig::new(JobSource::Indeed, "https://at.indeed.com"),
    ]
}

/// Reads a `{ "sites": [...] }` JSON file replacing the built-in site table.
pub fn load_sites(path: &Path) -> Result<Vec<SiteConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scrape sites from {}", path.display()))?;
    let file: SitesFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse scrape sites in {}", path.display()))?;

    for site in &file.sites {
        ensure!(!site.urls.is_empty(), "Site '{}' has no URLs", site.source);
    }

    Ok(file.sites)
}

pub struct CareerPageFetcher {
    site: SiteConfig,
}

impl CareerPageFetcher {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }

    async fn scrape_page(&self, client: &Client, raw_url: &str) -> Result<Vec<ScrapedItem>, FetchError> {
        let html = get_ok(client, raw_url).await?.text().await?;
        let Ok(page_url) = Url::parse(raw_url) else {
            warn!("{}: cannot resolve links against '{raw_url}'", self.site.source);
            return Ok(Vec::new());
        };
        Ok(extract_postings(&html, &page_url, self.site.selectors.as_ref()))
    }

    fn to_job(&self, index: usize, item: ScrapedItem) -> Job {
        let source = self.site.source;
        let location = item
            .location
            .filter(|loc| !loc.is_empty())
            .unwrap_or_else(|| DEFAULT_SCRAPED_LOCATION.to_string());

        normalize(&RawJob {
            id: format!("{}-{}-{}", source.slug(), index, item.url),
            source: Some(source),
            title: item.title,
            company: source.label().to_string(),
            location: location.clone(),
            remote: false,
            posted_at: None,
            category: None,
            provider_tags: Vec::new(),
            extra_keywords: vec![location],
            url: item.url,
            description: format!("Gefunden auf {}.", source.label()),
        })
    }
}

#[async_trait]
impl JobFetcher for CareerPageFetcher {
    fn name(&self) -> &str {
        self.site.source.label()
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<Job>, FetchError> {
        // URLs are requested concurrently; results keep configuration order.
        let pages = join_all(
            self.site
                .urls
                .iter()
                .map(|raw_url| async move { (raw_url, self.scrape_page(client, raw_url).await) }),
        )
        .await;

        let mut extracted = Vec::new();
        let mut first_error = None;
        let mut any_page_ok = false;

        for (raw_url, result) in pages {
            match result {
                Ok(items) => {
                    debug!("{}: {} candidates on {raw_url}", self.site.source, items.len());
                    any_page_ok = true;
                    extracted.extend(items);
                }
                Err(e) => {
                    warn!("{}: failed to scrape {raw_url}: {e}", self.site.source);
                    first_error.get_or_insert(e);
                }
            }
        }

        if !any_page_ok {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        let mut seen = HashSet::new();
        let jobs: Vec<Job> = extracted
            .into_iter()
            .filter(|item| seen.insert(format!("{}-{}", item.title, item.url)))
            .take(self.site.limit)
            .enumerate()
            .map(|(index, item)| self.to_job(index, item))
            .collect();

        info!("{}: {} postings scraped", self.site.source, jobs.len());
        Ok(jobs)
    }
}
