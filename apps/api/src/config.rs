use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::OPENAI_CHAT_URL;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed numbers abort startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Enables oracle ranking when present.
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub fetch_timeout: Duration,
    pub oracle_timeout: Duration,
    pub jobs_cache_ttl: Duration,
    /// JSON file replacing the built-in career-page list.
    pub scrape_sites_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            port: parse_or("PORT", &lookup, 8080)?,
            rust_log: optional(&lookup, "RUST_LOG").unwrap_or_else(|| "info".to_string()),
            openai_api_key: optional(&lookup, "OPENAI_API_KEY"),
            openai_api_url: optional(&lookup, "OPENAI_API_URL")
                .unwrap_or_else(|| OPENAI_CHAT_URL.to_string()),
            fetch_timeout: Duration::from_secs(parse_or("FETCH_TIMEOUT_SECS", &lookup, 20)?),
            oracle_timeout: Duration::from_secs(parse_or("ORACLE_TIMEOUT_SECS", &lookup, 60)?),
            jobs_cache_ttl: Duration::from_secs(parse_or("JOBS_CACHE_TTL_SECS", &lookup, 3600)?),
            scrape_sites_file: optional(&lookup, "SCRAPE_SITES_FILE").map(PathBuf::from),
        })
    }
}

/// Blank values count as unset.
fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
