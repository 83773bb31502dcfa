use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::agent::{parse_keywords, rank_jobs_for_agent, AgentJob, AgentPreferences, PreferRemote};
use crate::errors::AppError;
use crate::jobs::query::{filter_jobs, TagMatch};
use crate::models::job::{Job, JobTag, TagFilter, TAG_FILTERS};
use crate::state::AppState;

/// Raw query string of `/api/jobs/search`. Enum-valued parameters are parsed
/// by hand so bad values produce a `VALIDATION_ERROR` body.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub tags: Option<String>,
    pub tag_match: Option<String>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    pub prefer_remote: Option<String>,
}

impl SearchQuery {
    fn agent_requested(&self) -> bool {
        self.include.is_some() || self.exclude.is_some() || self.prefer_remote.is_some()
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SearchHits {
    Plain(Vec<Job>),
    Agent(Vec<AgentJob>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub total: usize,
    pub agent_applied: bool,
    pub jobs: SearchHits,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub count: usize,
}

/// GET /api/jobs
pub async fn handle_list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.jobs.jobs().await)
}

/// POST /api/jobs/refresh
pub async fn handle_refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    let jobs = state.jobs.refresh().await;
    Json(RefreshResponse { count: jobs.len() })
}

/// GET /api/filters
pub async fn handle_filters() -> Json<Vec<TagFilter>> {
    Json(TAG_FILTERS.to_vec())
}

/// GET /api/jobs/search
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let tags = parse_tags(params.tags.as_deref())?;
    let tag_match = parse_choice::<TagMatch>("tag_match", params.tag_match.as_deref())?;
    let preferences = if params.agent_requested() {
        Some(AgentPreferences {
            include_keywords: parse_keywords(params.include.as_deref().unwrap_or_default()),
            exclude_keywords: parse_keywords(params.exclude.as_deref().unwrap_or_default()),
            prefer_remote: parse_choice::<PreferRemote>("prefer_remote", params.prefer_remote.as_deref())?,
        })
    } else {
        None
    };

    let jobs = state.jobs.jobs().await;
    let filtered = filter_jobs(&jobs, &tags, tag_match);

    let response = match preferences {
        Some(preferences) => {
            let ranked = rank_jobs_for_agent(&filtered, &preferences);
            SearchResponse {
                total: ranked.len(),
                agent_applied: true,
                jobs: SearchHits::Agent(ranked),
            }
        }
        None => SearchResponse {
            total: filtered.len(),
            agent_applied: false,
            jobs: SearchHits::Plain(filtered),
        },
    };

    Ok(Json(response))
}

/// Comma-separated tag ids; blank entries are ignored.
fn parse_tags(raw: Option<&str>) -> Result<Vec<JobTag>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let mut tags = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let tag = part.parse::<JobTag>().map_err(AppError::Validation)?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// Parses a lowercase enum value through serde, defaulting when absent or blank.
fn parse_choice<T>(name: &str, raw: Option<&str>) -> Result<T, AppError>
where
    T: Default + serde::de::DeserializeOwned,
{
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(T::default()),
        Some(value) => serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
            .map_err(|_| AppError::Validation(format!("invalid value '{value}' for {name}"))),
    }
}
