//! Posting extraction from career-page markup.
//!
//! Two stages over one parsed document: configured selector rules first, then
//! a scan of every link whose text looks like a job posting.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::jobs::normalizer::collapse_whitespace;

/// Lower-case markers that make an anchor look like a job link.
const JOB_KEYWORDS: [&str; 8] = [
    "job",
    "stelle",
    "stellen",
    "karriere",
    "career",
    "vacancy",
    "position",
    "jobportal",
];

const MIN_ANCHOR_TEXT_CHARS: usize = 4;

/// CSS selectors describing a site's posting list. `title`, `link` and
/// `location` are resolved relative to each `item` match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorRules {
    pub item: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedItem {
    pub title: String,
    pub url: String,
    pub location: Option<String>,
}

/// Structured extraction, falling back to the anchor scan when it finds nothing.
pub fn extract_postings(html: &str, page_url: &Url, rules: Option<&SelectorRules>) -> Vec<ScrapedItem> {
    let document = Html::parse_document(html);

    if let Some(rules) = rules {
        let items = extract_by_selectors(&document, page_url, rules);
        if !items.is_empty() {
            return items;
        }
    }

    extract_anchors(&document, page_url)
}

pub fn extract_by_selectors(document: &Html, page_url: &Url, rules: &SelectorRules) -> Vec<ScrapedItem> {
    let Some(item_selector) = parse_selector(&rules.item) else {
        return Vec::new();
    };
    let title_selector = rules.title.as_deref().and_then(parse_selector);
    let link_selector = rules.link.as_deref().and_then(parse_selector);
    let location_selector = rules.location.as_deref().and_then(parse_selector);

    let mut items = Vec::new();
    for element in document.select(&item_selector) {
        let title_element = match &title_selector {
            Some(selector) => match element.select(selector).next() {
                Some(found) => found,
                None => continue,
            },
            None => element,
        };
        let link_element = match &link_selector {
            Some(selector) => element.select(selector).next(),
            None => Some(title_element),
        };

        let title = element_text(&title_element);
        let Some(href) = link_element.and_then(|el| el.value().attr("href")) else {
            continue;
        };
        if title.is_empty() {
            continue;
        }
        let Some(url) = resolve_link(page_url, href) else {
            continue;
        };

        let location = location_selector.as_ref().map(|selector| {
            element
                .select(selector)
                .next()
                .map(|el| element_text(&el))
                .unwrap_or_default()
        });

        items.push(ScrapedItem { title, url, location });
    }

    items
}

/// Heuristic scan of `a[href]` elements for job-like links.
pub fn extract_anchors(document: &Html, page_url: &Url) -> Vec<ScrapedItem> {
    let Some(anchor_selector) = parse_selector("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchor_selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let text = element_text(&anchor);
            if text.chars().count() < MIN_ANCHOR_TEXT_CHARS {
                return None;
            }
            let url = resolve_link(page_url, href)?;
            let haystack = format!("{text} {href}").to_lowercase();
            if !JOB_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
                return None;
            }
            Some(ScrapedItem {
                title: text,
                url,
                location: None,
            })
        })
        .collect()
}

/// Resolves `href` against the page URL; keeps only http(s) targets.
pub fn resolve_link(page_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = page_url.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn parse_selector(raw: &str) -> Option<Selector> {
    match Selector::parse(raw) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Ignoring invalid selector '{raw}': {e:?}");
            None
        }
    }
}
