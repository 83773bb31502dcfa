mod agent;
mod aggregator;
mod config;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod ranking;
mod routes;
mod sources;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::jobs::JobService;
use crate::ranking::select_ranker;
use crate::routes::build_router;
use crate::sources::{default_sites, load_sites};
use crate::state::AppState;

const USER_AGENT: &str = concat!("jobfinder/", env!("CARGO_PKG_VERSION"));

/// Added to the per-request timeout to form each source's overall budget, so a
/// source whose slowest request times out still returns its other results.
const SOURCE_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Jobfinder API v{}", env!("CARGO_PKG_VERSION"));

    // One HTTP client shared by every fetcher
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.fetch_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let sites = match &config.scrape_sites_file {
        Some(path) => load_sites(path)?,
        None => default_sites(),
    };

    let aggregator = Aggregator::with_default_apis(
        sites,
        client,
        config.fetch_timeout + SOURCE_TIMEOUT_GRACE,
    );
    info!("Aggregating from {} sources", aggregator.fetcher_count());

    // Oracle ranking only when OPENAI_API_KEY is set
    let ranker = select_ranker(
        config.openai_api_key.clone(),
        config.openai_api_url.clone(),
        config.oracle_timeout,
    )
    .context("Failed to build LLM client")?;
    info!("Ranking backend: {}", ranker.backend());

    let state = AppState {
        jobs: Arc::new(JobService::new(aggregator, ranker, config.jobs_cache_ttl)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
