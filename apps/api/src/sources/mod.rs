//! Job sources: every provider implements `JobFetcher`.
//!
//! Fetchers only report what went wrong; the aggregator decides that a failed
//! provider contributes zero jobs.

pub mod arbeitnow;
pub mod career_pages;
pub mod extract;
pub mod remotive;

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;

use crate::models::job::Job;

pub use arbeitnow::ArbeitnowFetcher;
pub use career_pages::{default_sites, load_sites, CareerPageFetcher, SiteConfig};
pub use remotive::RemotiveFetcher;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A single upstream provider.
#[async_trait]
pub trait JobFetcher: Send + Sync {
    /// Human-readable provider name used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self, client: &Client) -> Result<Vec<Job>, FetchError>;
}

/// Issues a GET and rejects non-2xx responses.
pub(crate) async fn get_ok(client: &Client, url: &str) -> Result<Response, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

/// GETs a JSON document. The body is read as text first so decode failures
/// surface as `FetchError::Parse` rather than a transport error.
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<T, FetchError> {
    let body = get_ok(client, url).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serves `router` on an ephemeral local port and returns its base URL.
    pub async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}
