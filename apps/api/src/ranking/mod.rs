//! Ranking: pluggable, trait-based scorer that assigns `rank_score` to every job.
//!
//! Default: `HeuristicRanker` (pure, deterministic, always available).
//! Optional: `OracleRanker` (asks the LLM for 0–100 scores, falls back to the
//! heuristic on any failure).
//!
//! `JobService` holds an `Arc<dyn JobRanker>` chosen at startup by `select_ranker`.

pub mod prompts;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::models::job::{Job, JobTag};
use crate::ranking::prompts::{RANK_PROMPT_TEMPLATE, RANK_SYSTEM};

/// Only the first jobs of a batch are sent to the oracle.
pub const ORACLE_BATCH_LIMIT: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap ranking backends without touching callers.
/// Ranking never fails: backends degrade to heuristic scores instead.
#[async_trait]
pub trait JobRanker: Send + Sync {
    async fn rank(&self, jobs: Vec<Job>) -> Vec<Job>;

    /// "heuristic" or "oracle", used in logs and health output.
    fn backend(&self) -> &'static str;
}

/// Oracle ranking when a credential is configured, heuristic otherwise.
pub fn select_ranker(
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
) -> Result<Arc<dyn JobRanker>, LlmError> {
    Ok(match api_key {
        Some(key) => Arc::new(OracleRanker::new(LlmClient::new(key, endpoint, timeout)?)),
        None => Arc::new(HeuristicRanker),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicRanker
// ────────────────────────────────────────────────────────────────────────────

/// Rule-based relevance:
/// remote +15, +5 per tag, quereinsteiger +10, ohne-vorkenntnisse +8,
/// ohne-kundenkontakt +6, beauty +4.
pub fn heuristic_score(job: &Job) -> f64 {
    let mut score = 0.0;
    if job.is_remote {
        score += 15.0;
    }
    score += 5.0 * job.tags.len() as f64;
    if job.has_tag(JobTag::Quereinsteiger) {
        score += 10.0;
    }
    if job.has_tag(JobTag::OhneVorkenntnisse) {
        score += 8.0;
    }
    if job.has_tag(JobTag::OhneKundenkontakt) {
        score += 6.0;
    }
    if job.has_tag(JobTag::Beauty) {
        score += 4.0;
    }
    score
}

pub fn apply_heuristic(jobs: Vec<Job>) -> Vec<Job> {
    jobs.into_iter()
        .map(|mut job| {
            job.rank_score = Some(heuristic_score(&job));
            job
        })
        .collect()
}

pub struct HeuristicRanker;

#[async_trait]
impl JobRanker for HeuristicRanker {
    async fn rank(&self, jobs: Vec<Job>) -> Vec<Job> {
        apply_heuristic(jobs)
    }

    fn backend(&self) -> &'static str {
        "heuristic"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Oracle response parsing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ScoreParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of {{id, score}} objects")]
    NotAnArray,
}

/// Parses the oracle's `[{"id": "...", "score": 87}, ...]` reply.
///
/// Accepts code-fenced output, a `{"scores": [...]}` wrapper, numeric ids and
/// numeric-string scores. Entries without a usable id or score are skipped so
/// those jobs fall back to the heuristic individually.
pub fn parse_scores(payload: &str) -> Result<HashMap<String, f64>, ScoreParseError> {
    let value: Value = serde_json::from_str(strip_json_fences(payload))?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("scores") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(ScoreParseError::NotAnArray),
        },
        _ => return Err(ScoreParseError::NotAnArray),
    };

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let id = match entry.get("id")? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let score = match entry.get("score")? {
                Value::Number(n) => n.as_f64()?,
                Value::String(s) => s.trim().parse::<f64>().ok()?,
                _ => return None,
            };
            score.is_finite().then_some((id, score))
        })
        .collect())
}

// ────────────────────────────────────────────────────────────────────────────
// OracleRanker
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
enum OracleError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("unusable oracle reply: {0}")]
    Parse(#[from] ScoreParseError),
}

#[derive(Debug, Serialize)]
struct OracleInput<'a> {
    id: &'a str,
    title: &'a str,
    company: &'a str,
    location: &'a str,
    summary: &'a str,
    tags: &'a BTreeSet<JobTag>,
}

pub struct OracleRanker {
    llm: LlmClient,
}

impl OracleRanker {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn oracle_scores(&self, jobs: &[Job]) -> Result<HashMap<String, f64>, OracleError> {
        let input: Vec<OracleInput<'_>> = jobs
            .iter()
            .take(ORACLE_BATCH_LIMIT)
            .map(|job| OracleInput {
                id: &job.id,
                title: &job.title,
                company: &job.company,
                location: &job.location,
                summary: &job.summary,
                tags: &job.tags,
            })
            .collect();
        let jobs_json = serde_json::to_string(&input).map_err(ScoreParseError::from)?;
        let prompt = RANK_PROMPT_TEMPLATE.replace("{jobs_json}", &jobs_json);

        let reply = self.llm.call(&prompt, RANK_SYSTEM).await?;
        Ok(parse_scores(&reply)?)
    }
}

#[async_trait]
impl JobRanker for OracleRanker {
    async fn rank(&self, jobs: Vec<Job>) -> Vec<Job> {
        if jobs.is_empty() {
            return jobs;
        }

        match self.oracle_scores(&jobs).await {
            Ok(scores) => {
                info!("Oracle scored {} of {} jobs", scores.len(), jobs.len());
                jobs.into_iter()
                    .map(|mut job| {
                        let score = scores
                            .get(&job.id)
                            .copied()
                            .unwrap_or_else(|| heuristic_score(&job));
                        job.rank_score = Some(score);
                        job
                    })
                    .collect()
            }
            Err(e) => {
                warn!("Oracle ranking failed, using heuristic scores: {e}");
                apply_heuristic(jobs)
            }
        }
    }

    fn backend(&self) -> &'static str {
        "oracle"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobSource;
    use crate::sources::test_support::serve;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Mutex;

    fn make_job(id: &str, is_remote: bool, tags: &[JobTag]) -> Job {
        Job {
            id: id.to_string(),
            title: format!("Job {id}"),
            company: "Acme".to_string(),
            location: if is_remote { "Remote" } else { "Innsbruck" }.to_string(),
            is_remote,
            posted_at: Utc::now(),
            source: JobSource::Remotive,
            tags: tags.iter().copied().collect(),
            url: format!("https://example.com/{id}"),
            summary: "Summary".to_string(),
            rank_score: None,
        }
    }

    fn oracle_for(base: &str) -> OracleRanker {
        OracleRanker::new(LlmClient::new(
            "sk-test".to_string(),
            format!("{base}/v1/chat/completions"),
            Duration::from_secs(5),
        )
        .unwrap())
    }

    fn chat_reply(content: &str) -> serde_json::Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[test]
    fn test_heuristic_untagged_onsite_is_zero() {
        assert_eq!(heuristic_score(&make_job("a", false, &[])), 0.0);
    }

    #[test]
    fn test_heuristic_remote_only() {
        assert_eq!(heuristic_score(&make_job("a", true, &[])), 15.0);
    }

    #[test]
    fn test_heuristic_full_scenario() {
        // 15 remote + 4 tags * 5 + 10 + 8 + 6 = 59
        let job = make_job(
            "a",
            true,
            &[
                JobTag::HomeOffice,
                JobTag::Quereinsteiger,
                JobTag::OhneVorkenntnisse,
                JobTag::OhneKundenkontakt,
            ],
        );
        assert_eq!(heuristic_score(&job), 59.0);
    }

    #[test]
    fn test_heuristic_beauty_only() {
        assert_eq!(heuristic_score(&make_job("a", false, &[JobTag::Beauty])), 9.0);
    }

    #[tokio::test]
    async fn test_no_credential_means_exact_heuristic_scores() {
        let ranker = select_ranker(None, "http://unused".to_string(), Duration::from_secs(1)).unwrap();
        assert_eq!(ranker.backend(), "heuristic");

        let jobs = vec![
            make_job("a", true, &[JobTag::HomeOffice]),
            make_job("b", false, &[JobTag::Beauty, JobTag::OhneKundenkontakt]),
            make_job("c", false, &[]),
        ];
        let ranked = ranker.rank(jobs.clone()).await;
        for (before, after) in jobs.iter().zip(&ranked) {
            assert_eq!(after.rank_score, Some(heuristic_score(before)));
        }
    }

    #[test]
    fn test_credential_selects_oracle() {
        let ranker = select_ranker(
            Some("sk-test".to_string()),
            "http://unused".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(ranker.backend(), "oracle");
    }

    #[test]
    fn test_parse_scores_plain_array() {
        let scores = parse_scores(r#"[{"id":"a","score":87},{"id":"b","score":12.5}]"#).unwrap();
        assert_eq!(scores.get("a"), Some(&87.0));
        assert_eq!(scores.get("b"), Some(&12.5));
    }

    #[test]
    fn test_parse_scores_fenced_wrapped_and_lenient_entries() {
        let payload = "```json\n{\"scores\": [{\"id\": 7, \"score\": \"42\"}, {\"id\": \"x\"}, {\"score\": 3}]}\n```";
        let scores = parse_scores(payload).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores.get("7"), Some(&42.0));
    }

    #[test]
    fn test_parse_scores_rejects_prose_and_objects() {
        assert!(matches!(parse_scores("Here are the scores!"), Err(ScoreParseError::Json(_))));
        assert!(matches!(parse_scores(r#"{"a": 1}"#), Err(ScoreParseError::NotAnArray)));
        assert!(matches!(parse_scores("42"), Err(ScoreParseError::NotAnArray)));
    }

    #[tokio::test]
    async fn test_oracle_scores_with_individual_fallback() {
        let seen_jobs = std::sync::Arc::new(Mutex::new(0usize));
        let seen = seen_jobs.clone();
        let handler = move |Json(body): Json<serde_json::Value>| {
            let seen = seen.clone();
            async move {
                let prompt = body["messages"][1]["content"].as_str().unwrap_or_default().to_string();
                let (_, jobs_json) = prompt.split_once("Jobs:\n").unwrap();
                let sent: Vec<serde_json::Value> = serde_json::from_str(jobs_json).unwrap();
                *seen.lock().unwrap() = sent.len();
                Json(chat_reply(r#"[{"id":"job-0","score":91},{"id":"job-1","score":77}]"#))
            }
        };
        let base = serve(Router::new().route("/v1/chat/completions", post(handler))).await;

        let jobs: Vec<Job> = (0..60)
            .map(|i| make_job(&format!("job-{i}"), i % 2 == 0, &[JobTag::Beauty]))
            .collect();
        let ranked = oracle_for(&base).rank(jobs).await;

        assert_eq!(*seen_jobs.lock().unwrap(), ORACLE_BATCH_LIMIT);
        assert_eq!(ranked.len(), 60);
        assert_eq!(ranked[0].rank_score, Some(91.0));
        assert_eq!(ranked[1].rank_score, Some(77.0));
        // job-2: remote + beauty → 15 + 5 + 4
        assert_eq!(ranked[2].rank_score, Some(24.0));
        // job-55: onsite + beauty, outside the oracle batch
        assert_eq!(ranked[55].rank_score, Some(9.0));
    }

    #[tokio::test]
    async fn test_oracle_http_error_falls_back_for_whole_batch() {
        let base = serve(Router::new().route(
            "/v1/chat/completions",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let jobs = vec![make_job("a", true, &[]), make_job("b", false, &[JobTag::Beauty])];
        let ranked = oracle_for(&base).rank(jobs).await;
        assert_eq!(ranked[0].rank_score, Some(15.0));
        assert_eq!(ranked[1].rank_score, Some(9.0));
    }

    #[tokio::test]
    async fn test_oracle_malformed_reply_falls_back_for_whole_batch() {
        let base = serve(Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(chat_reply("Ich kann das leider nicht bewerten.")) }),
        ))
        .await;
        let jobs = vec![make_job("a", true, &[])];
        let ranked = oracle_for(&base).rank(jobs).await;
        assert_eq!(ranked[0].rank_score, Some(15.0));
    }

    #[tokio::test]
    async fn test_oracle_unreachable_falls_back() {
        let ranker = oracle_for("http://127.0.0.1:9");
        let ranked = ranker.rank(vec![make_job("a", false, &[JobTag::Quereinsteiger])]).await;
        assert_eq!(ranked[0].rank_score, Some(15.0));
    }

    #[tokio::test]
    async fn test_oracle_skips_call_for_empty_batch() {
        let ranker = oracle_for("http://127.0.0.1:9");
        assert!(ranker.rank(Vec::new()).await.is_empty());
    }
}
