//! Query Filter: location rule, tag filter and display order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::job::{Job, JobTag};

/// Places that pass the location rule without a remote flag.
const REGION_LOCATIONS: [&str; 3] = ["Innsbruck", "Innsbruck-Land", "Tirol"];

/// How multiple active tags combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// Job must carry every active tag.
    #[default]
    All,
    /// Job must carry at least one active tag.
    Any,
}

/// Remote jobs always pass; everything else must be in Innsbruck or Tirol.
pub fn matches_location_rules(job: &Job) -> bool {
    job.is_remote || REGION_LOCATIONS.iter().any(|place| job.location.contains(place))
}

pub fn matches_tags(job: &Job, active_tags: &[JobTag], mode: TagMatch) -> bool {
    if active_tags.is_empty() {
        return true;
    }
    match mode {
        TagMatch::All => active_tags.iter().all(|tag| job.has_tag(*tag)),
        TagMatch::Any => active_tags.iter().any(|tag| job.has_tag(*tag)),
    }
}

/// Applies the location and tag rules, then sorts by rank score and recency.
pub fn filter_jobs(jobs: &[Job], active_tags: &[JobTag], mode: TagMatch) -> Vec<Job> {
    let mut filtered: Vec<Job> = jobs
        .iter()
        .filter(|job| matches_location_rules(job))
        .filter(|job| matches_tags(job, active_tags, mode))
        .cloned()
        .collect();

    filtered.sort_by(compare_for_display);
    filtered
}

fn compare_for_display(a: &Job, b: &Job) -> Ordering {
    let a_score = a.rank_score.unwrap_or(0.0);
    let b_score = b.rank_score.unwrap_or(0.0);
    b_score
        .partial_cmp(&a_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.posted_at.cmp(&a.posted_at))
}
