use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category label describing how approachable a posting is.
/// Ordered so tag sets serialize deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobTag {
    Quereinsteiger,
    HomeOffice,
    OhneVorkenntnisse,
    OhneKundenkontakt,
    Beauty,
}

impl JobTag {
    pub const ALL: [JobTag; 5] = [
        JobTag::Quereinsteiger,
        JobTag::HomeOffice,
        JobTag::OhneVorkenntnisse,
        JobTag::OhneKundenkontakt,
        JobTag::Beauty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobTag::Quereinsteiger => "quereinsteiger",
            JobTag::HomeOffice => "home-office",
            JobTag::OhneVorkenntnisse => "ohne-vorkenntnisse",
            JobTag::OhneKundenkontakt => "ohne-kundenkontakt",
            JobTag::Beauty => "beauty",
        }
    }
}

impl fmt::Display for JobTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobTag {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        JobTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown tag '{value}'"))
    }
}

/// Whether a source is read from a structured API or scraped from a career page.
/// Drives the dedupe key: scraped postings carry no real company name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Api,
    Scraped,
}

/// Named upstream provider. Serialized as the provider's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobSource {
    #[serde(rename = "Karriere.at")]
    KarriereAt,
    #[serde(rename = "StepStone")]
    StepStone,
    #[serde(rename = "LinkedIn")]
    LinkedIn,
    #[serde(rename = "ÖH Jobbörse")]
    OehJobboerse,
    #[serde(rename = "AMS")]
    Ams,
    #[serde(rename = "Company")]
    Company,
    #[serde(rename = "Remotive")]
    Remotive,
    #[serde(rename = "Arbeitnow")]
    Arbeitnow,
    #[serde(rename = "Jobs TT")]
    JobsTt,
    #[serde(rename = "Tirolerjobs")]
    Tirolerjobs,
    #[serde(rename = "Willkommen Tirol")]
    WillkommenTirol,
    #[serde(rename = "Uni Innsbruck")]
    UniInnsbruck,
    #[serde(rename = "MCI Career Center")]
    MciCareerCenter,
    #[serde(rename = "Industrie Tirol")]
    IndustrieTirol,
    #[serde(rename = "Startup Tirol")]
    StartupTirol,
    #[serde(rename = "Tirol GV")]
    TirolGv,
    #[serde(rename = "Innsbruck GV")]
    InnsbruckGv,
    #[serde(rename = "IKB")]
    Ikb,
    #[serde(rename = "Tirol Kliniken")]
    TirolKliniken,
    #[serde(rename = "MetaJob")]
    MetaJob,
    #[serde(rename = "Indeed")]
    Indeed,
}

impl JobSource {
    pub fn label(&self) -> &'static str {
        match self {
            JobSource::KarriereAt => "Karriere.at",
            JobSource::StepStone => "StepStone",
            JobSource::LinkedIn => "LinkedIn",
            JobSource::OehJobboerse => "ÖH Jobbörse",
            JobSource::Ams => "AMS",
            JobSource::Company => "Company",
            JobSource::Remotive => "Remotive",
            JobSource::Arbeitnow => "Arbeitnow",
            JobSource::JobsTt => "Jobs TT",
            JobSource::Tirolerjobs => "Tirolerjobs",
            JobSource::WillkommenTirol => "Willkommen Tirol",
            JobSource::UniInnsbruck => "Uni Innsbruck",
            JobSource::MciCareerCenter => "MCI Career Center",
            JobSource::IndustrieTirol => "Industrie Tirol",
            JobSource::StartupTirol => "Startup Tirol",
            JobSource::TirolGv => "Tirol GV",
            JobSource::InnsbruckGv => "Innsbruck GV",
            JobSource::Ikb => "IKB",
            JobSource::TirolKliniken => "Tirol Kliniken",
            JobSource::MetaJob => "MetaJob",
            JobSource::Indeed => "Indeed",
        }
    }

    /// Lower-cased label with whitespace runs replaced by `-`, used as an id prefix.
    pub fn slug(&self) -> String {
        self.label()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            JobSource::Remotive | JobSource::Arbeitnow => SourceKind::Api,
            _ => SourceKind::Scraped,
        }
    }
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical normalized posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub is_remote: bool,
    pub posted_at: DateTime<Utc>,
    pub source: JobSource,
    pub tags: BTreeSet<JobTag>,
    pub url: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_score: Option<f64>,
}

impl Job {
    pub fn has_tag(&self, tag: JobTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Key used to collapse duplicate postings across providers.
    /// API postings: `title-company-url`; scraped postings: `title-url`.
    pub fn dedupe_key(&self) -> String {
        match self.source.kind() {
            SourceKind::Api => format!("{}-{}-{}", self.title, self.company, self.url),
            SourceKind::Scraped => format!("{}-{}", self.title, self.url),
        }
    }
}

/// Filter catalog entry shown next to the job list.
#[derive(Debug, Clone, Serialize)]
pub struct TagFilter {
    pub id: JobTag,
    pub label: &'static str,
    pub description: &'static str,
}

pub const TAG_FILTERS: [TagFilter; 5] = [
    TagFilter {
        id: JobTag::Quereinsteiger,
        label: "Quereinsteiger",
        description: "Ideal für einen Neustart ohne klassische Ausbildung.",
    },
    TagFilter {
        id: JobTag::HomeOffice,
        label: "Home-Office",
        description: "Flexible Jobs mit Remote-Anteil.",
    },
    TagFilter {
        id: JobTag::OhneVorkenntnisse,
        label: "Ohne Vorkenntnisse",
        description: "Einstiegsrollen mit kurzer Einarbeitung.",
    },
    TagFilter {
        id: JobTag::OhneKundenkontakt,
        label: "Ohne Kundenkontakt",
        description: "Fokus auf Backoffice oder interne Aufgaben.",
    },
    TagFilter {
        id: JobTag::Beauty,
        label: "Beautyjobs",
        description: "Kosmetik, Studio, Wellness oder Beauty-Tech.",
    },
];
