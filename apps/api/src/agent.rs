//! Agent filter: re-ranks an already ranked list against free-text preferences.
//!
//! Runs after the query filter. Exclusion is a hard gate; inclusion keywords
//! both gate and add weighted field scores.

use serde::{Deserialize, Serialize};

use crate::models::job::Job;

const TITLE_WEIGHT: f64 = 20.0;
const TAGS_WEIGHT: f64 = 18.0;
const SUMMARY_WEIGHT: f64 = 10.0;
const COMPANY_WEIGHT: f64 = 8.0;
const LOCATION_WEIGHT: f64 = 6.0;

const REMOTE_MATCH_BOOST: i32 = 12;
const ONSITE_MATCH_BOOST: i32 = 8;
const MISMATCH_PENALTY: i32 = -8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferRemote {
    #[default]
    Any,
    Remote,
    Onsite,
}

#[derive(Debug, Clone, Default)]
pub struct AgentPreferences {
    pub include_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub prefer_remote: PreferRemote,
}

/// A job enriched with its agent score. Serializes as the flat job object
/// plus `agentScore`, `agentMatches` and `agentRemoteBoost`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentJob {
    #[serde(flatten)]
    pub job: Job,
    pub agent_score: f64,
    pub agent_matches: Vec<String>,
    pub agent_remote_boost: i32,
}

/// Splits user input on commas and newlines into normalized keywords.
pub fn parse_keywords(input: &str) -> Vec<String> {
    normalize_keywords(input.split([',', '\n']))
}

fn normalize_keywords<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| value.chars().count() > 1)
        .collect()
}

/// Lower-cases, turns punctuation into spaces and collapses whitespace.
pub fn normalize_text(value: &str) -> String {
    let spaced: String = value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn compact(value: &str) -> String {
    value.split_whitespace().collect()
}

/// Normalized and whitespace-free forms of a keyword, deduplicated.
pub fn keyword_variants(keyword: &str) -> Vec<String> {
    let normalized = normalize_text(keyword);
    let squeezed = compact(&normalized);
    let mut variants = Vec::with_capacity(2);
    for variant in [normalized, squeezed] {
        if !variant.is_empty() && !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    variants
}

/// One searchable text in its normalized and compact forms.
struct FieldText {
    text: String,
    compact: String,
}

impl FieldText {
    fn new(raw: &str) -> Self {
        let text = normalize_text(raw);
        let compact = compact(&text);
        Self { text, compact }
    }

    fn contains_any(&self, variants: &[String]) -> bool {
        variants
            .iter()
            .any(|v| self.text.contains(v.as_str()) || self.compact.contains(v.as_str()))
    }
}

struct JobFields {
    title: FieldText,
    tags: FieldText,
    summary: FieldText,
    company: FieldText,
    location: FieldText,
    flattened: FieldText,
}

impl JobFields {
    fn new(job: &Job) -> Self {
        let tags = job
            .tags
            .iter()
            .map(|tag| tag.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let flattened = [
            job.title.as_str(),
            job.company.as_str(),
            job.location.as_str(),
            job.summary.as_str(),
            tags.as_str(),
        ]
        .join(" ");

        Self {
            title: FieldText::new(&job.title),
            tags: FieldText::new(&tags),
            summary: FieldText::new(&job.summary),
            company: FieldText::new(&job.company),
            location: FieldText::new(&job.location),
            flattened: FieldText::new(&flattened),
        }
    }

    fn matches(&self, keyword: &str) -> bool {
        self.flattened.contains_any(&keyword_variants(keyword))
    }

    fn keyword_score(&self, keyword: &str) -> f64 {
        let variants = keyword_variants(keyword);
        [
            (&self.title, TITLE_WEIGHT),
            (&self.tags, TAGS_WEIGHT),
            (&self.summary, SUMMARY_WEIGHT),
            (&self.company, COMPANY_WEIGHT),
            (&self.location, LOCATION_WEIGHT),
        ]
        .into_iter()
        .filter(|(field, _)| field.contains_any(&variants))
        .map(|(_, weight)| weight)
        .sum()
    }
}

fn remote_boost(preference: PreferRemote, is_remote: bool) -> i32 {
    match (preference, is_remote) {
        (PreferRemote::Any, _) => 0,
        (PreferRemote::Remote, true) => REMOTE_MATCH_BOOST,
        (PreferRemote::Onsite, false) => ONSITE_MATCH_BOOST,
        _ => MISMATCH_PENALTY,
    }
}

/// Drops excluded jobs, enforces the inclusion gate and sorts the rest by
/// `rankScore + keyword score + remote boost`, highest first. Ties keep their
/// input order.
pub fn rank_jobs_for_agent(jobs: &[Job], preferences: &AgentPreferences) -> Vec<AgentJob> {
    let include = normalize_keywords(preferences.include_keywords.iter().map(String::as_str));
    let exclude = normalize_keywords(preferences.exclude_keywords.iter().map(String::as_str));

    let mut ranked: Vec<AgentJob> = jobs
        .iter()
        .filter_map(|job| {
            let fields = JobFields::new(job);
            if exclude.iter().any(|keyword| fields.matches(keyword)) {
                return None;
            }

            let matches: Vec<String> = include
                .iter()
                .filter(|keyword| fields.matches(keyword))
                .cloned()
                .collect();
            if !include.is_empty() && matches.is_empty() {
                return None;
            }

            let keyword_score: f64 = matches.iter().map(|k| fields.keyword_score(k)).sum();
            let boost = remote_boost(preferences.prefer_remote, job.is_remote);

            Some(AgentJob {
                agent_score: job.rank_score.unwrap_or(0.0) + keyword_score + f64::from(boost),
                agent_matches: matches,
                agent_remote_boost: boost,
                job: job.clone(),
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.agent_score.total_cmp(&a.agent_score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{JobSource, JobTag};
    use chrono::Utc;

    fn make_job(id: &str, title: &str, is_remote: bool, tags: &[JobTag], rank: f64) -> Job {
        Job {
            id: id.to_string(),
            title: title.to_string(),
            company: "Acme GmbH".to_string(),
            location: if is_remote { "Remote" } else { "Innsbruck" }.to_string(),
            is_remote,
            posted_at: Utc::now(),
            source: JobSource::Remotive,
            tags: tags.iter().copied().collect(),
            url: format!("https://example.com/{id}"),
            summary: "Wir suchen Verstärkung im Team.".to_string(),
            rank_score: Some(rank),
        }
    }

    fn prefs(include: &str, exclude: &str, prefer_remote: PreferRemote) -> AgentPreferences {
        AgentPreferences {
            include_keywords: parse_keywords(include),
            exclude_keywords: parse_keywords(exclude),
            prefer_remote,
        }
    }

    #[test]
    fn test_parse_keywords_splits_trims_and_drops_short() {
        assert_eq!(
            parse_keywords(" Data, x ,\nBack Office\n,,"),
            vec!["data".to_string(), "back office".to_string()]
        );
    }

    #[test]
    fn test_normalize_text_replaces_punctuation() {
        assert_eq!(normalize_text("  Front-End/Dev (m/w/d)! "), "front end dev m w d");
        assert_eq!(normalize_text("Köchin & Kellnerin"), "köchin kellnerin");
    }

    #[test]
    fn test_keyword_variants_dedupe() {
        assert_eq!(keyword_variants("Home Office"), vec!["home office", "homeoffice"]);
        assert_eq!(keyword_variants("data"), vec!["data"]);
        assert!(keyword_variants("--").is_empty());
    }

    #[test]
    fn test_exclusion_is_hard_gate() {
        let jobs = vec![
            make_job("a", "Sales Manager", false, &[], 100.0),
            make_job("b", "Data Analyst", false, &[], 10.0),
        ];
        let ranked = rank_jobs_for_agent(&jobs, &prefs("", "sales", PreferRemote::Any));
        let ids: Vec<&str> = ranked.iter().map(|j| j.job.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_excluded_job_never_survives_even_with_include_match() {
        let jobs = vec![make_job("a", "Data Sales", true, &[], 500.0)];
        let ranked = rank_jobs_for_agent(&jobs, &prefs("data", "sales", PreferRemote::Remote));
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_inclusion_gate_requires_a_match() {
        let jobs = vec![
            make_job("a", "Koch", false, &[], 50.0),
            make_job("b", "Data Analyst", false, &[], 0.0),
        ];
        let ranked = rank_jobs_for_agent(&jobs, &prefs("data", "", PreferRemote::Any));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].job.id, "b");
        assert_eq!(ranked[0].agent_matches, vec!["data".to_string()]);
    }

    #[test]
    fn test_field_weights_and_remote_boost_add_up() {
        // "office" hits title (20) and tags via "home office" (18).
        let jobs = vec![make_job("a", "Office Assistant", true, &[JobTag::HomeOffice], 30.0)];
        let ranked = rank_jobs_for_agent(&jobs, &prefs("office", "", PreferRemote::Remote));
        assert_eq!(ranked[0].agent_remote_boost, 12);
        assert_eq!(ranked[0].agent_score, 30.0 + 20.0 + 18.0 + 12.0);
    }

    #[test]
    fn test_compact_form_matches_across_spacing() {
        let jobs = vec![make_job("a", "Mitarbeiter Homeoffice", true, &[], 0.0)];
        let ranked = rank_jobs_for_agent(&jobs, &prefs("home office", "", PreferRemote::Any));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].agent_score, TITLE_WEIGHT);
    }

    #[test]
    fn test_remote_boost_table() {
        assert_eq!(remote_boost(PreferRemote::Any, true), 0);
        assert_eq!(remote_boost(PreferRemote::Remote, true), 12);
        assert_eq!(remote_boost(PreferRemote::Remote, false), -8);
        assert_eq!(remote_boost(PreferRemote::Onsite, false), 8);
        assert_eq!(remote_boost(PreferRemote::Onsite, true), -8);
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let jobs = vec![
            make_job("a", "Koch", false, &[], 10.0),
            make_job("b", "Kellner", false, &[], 40.0),
            make_job("c", "Barista", false, &[], 10.0),
        ];
        let ranked = rank_jobs_for_agent(&jobs, &AgentPreferences::default());
        let ids: Vec<&str> = ranked.iter().map(|j| j.job.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_agent_job_serializes_flat() {
        let jobs = vec![make_job("a", "Koch", false, &[], 5.0)];
        let ranked = rank_jobs_for_agent(&jobs, &prefs("", "", PreferRemote::Onsite));
        let value = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(value["id"], "a");
        assert_eq!(value["agentScore"], 13.0);
        assert_eq!(value["agentRemoteBoost"], 8);
        assert!(value["agentMatches"].as_array().unwrap().is_empty());
    }
}
