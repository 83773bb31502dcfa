//! Normalizer: turns one provider record into the canonical `Job`.
//!
//! No validation happens here: fetchers skip records serde cannot decode
//! before they reach `normalize`.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::models::job::{Job, JobSource, JobTag};

/// Substrings (lower-case) that mark a location as remote.
pub const REMOTE_KEYWORDS: [&str; 5] = ["remote", "anywhere", "home office", "home-office", "homeoffice"];

const ENTRY_LEVEL_KEYWORDS: [&str; 4] = ["junior", "entry", "trainee", "assistant"];
const BACK_OFFICE_KEYWORDS: [&str; 7] = [
    "backoffice",
    "data",
    "qa",
    "accounting",
    "finance",
    "analytics",
    "engineering",
];
const BEAUTY_KEYWORDS: [&str; 4] = ["beauty", "cosmetic", "wellness", "skincare"];

const SUMMARY_MAX_CHARS: usize = 200;
const SUMMARY_CUT_CHARS: usize = 197;
const ELLIPSIS: char = '…';

/// A provider record mapped into source-independent field names.
#[derive(Debug, Clone, Default)]
pub struct RawJob {
    /// Final job id, already namespaced by the fetcher.
    pub id: String,
    pub source: Option<JobSource>,
    pub title: String,
    pub company: String,
    pub location: String,
    /// Provider-side remote flag (Arbeitnow exposes one).
    pub remote: bool,
    pub posted_at: Option<String>,
    pub category: Option<String>,
    pub provider_tags: Vec<String>,
    /// Additional text fed into tag derivation only.
    pub extra_keywords: Vec<String>,
    pub url: String,
    pub description: String,
}

/// Normalizes a raw record, falling back to the current time for unknown dates.
pub fn normalize(raw: &RawJob) -> Job {
    normalize_at(raw, Utc::now())
}

/// Same as [`normalize`] with an explicit clock for the date fallback.
pub fn normalize_at(raw: &RawJob, now: DateTime<Utc>) -> Job {
    let location = normalize_location(&raw.location);
    let is_remote = raw.remote || location == "Remote";
    let location = if is_remote { "Remote".to_string() } else { location };

    let tag_text = raw
        .category
        .iter()
        .chain(raw.provider_tags.iter())
        .chain(raw.extra_keywords.iter())
        .fold(format!("{} {}", raw.title, raw.company), |mut acc, part| {
            acc.push(' ');
            acc.push_str(part);
            acc
        });

    Job {
        id: raw.id.clone(),
        title: raw.title.clone(),
        company: raw.company.clone(),
        location,
        is_remote,
        posted_at: raw
            .posted_at
            .as_deref()
            .and_then(parse_posted_at)
            .unwrap_or(now),
        source: raw.source.unwrap_or(JobSource::Company),
        tags: derive_tags(&tag_text, is_remote),
        url: raw.url.clone(),
        summary: build_summary(&raw.description, &raw.title, &raw.company),
        rank_score: None,
    }
}

pub fn is_remote_text(value: &str) -> bool {
    let lowered = value.to_lowercase();
    REMOTE_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// Canonicalizes remote-indicating locations to the literal `"Remote"`.
pub fn normalize_location(value: &str) -> String {
    if is_remote_text(value) {
        "Remote".to_string()
    } else {
        value.to_string()
    }
}

/// Keyword-group tag derivation. Purely additive: groups only ever insert.
pub fn derive_tags(text: &str, is_remote: bool) -> BTreeSet<JobTag> {
    let combined = text.to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|kw| combined.contains(kw));
    let mut tags = BTreeSet::new();

    if is_remote || hit(&REMOTE_KEYWORDS) {
        tags.insert(JobTag::HomeOffice);
    }
    if hit(&ENTRY_LEVEL_KEYWORDS) {
        tags.insert(JobTag::Quereinsteiger);
        tags.insert(JobTag::OhneVorkenntnisse);
    }
    if hit(&BACK_OFFICE_KEYWORDS) {
        tags.insert(JobTag::OhneKundenkontakt);
    }
    if hit(&BEAUTY_KEYWORDS) {
        tags.insert(JobTag::Beauty);
    }

    tags
}

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"))
}

/// Replaces tags with spaces and collapses whitespace.
pub fn strip_html(value: &str) -> String {
    let without_tags = markup_pattern().replace_all(value, " ");
    collapse_whitespace(&without_tags)
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain-text excerpt of at most 200 characters.
pub fn build_summary(description: &str, title: &str, company: &str) -> String {
    let cleaned = strip_html(description);
    if cleaned.is_empty() {
        return format!("{title} bei {company}.");
    }
    if cleaned.chars().count() > SUMMARY_MAX_CHARS {
        let mut cut: String = cleaned.chars().take(SUMMARY_CUT_CHARS).collect();
        cut.push(ELLIPSIS);
        return cut;
    }
    cleaned
}

/// Accepts RFC 3339, naive ISO date-times (taken as UTC), plain dates and
/// Unix timestamps in seconds.
pub fn parse_posted_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
