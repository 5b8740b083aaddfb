//! Post-fetch sanitization of researcher profiles.
//!
//! Fetched profiles are untrusted until they pass three stages, in order:
//! authorship verification, title deduplication, URL repair. Truncation to
//! the caller's requested limit happens last, so the limit applies to
//! validated papers only.

use std::collections::HashSet;

use reqwest::Url;
use tracing::debug;

use crate::errors::AppError;
use crate::models::candidate::Paper;
use crate::models::matching::RawProfile;

/// Bare-lastname matching is only allowed for surnames longer than this:
/// short surnames collide with unrelated authors far too often.
const MIN_BARE_LASTNAME_LEN: usize = 5;

const SCHOLAR_SEARCH_BASE: &str = "https://scholar.google.com/scholar";

/// Runs the full sanitization pass over a freshly fetched profile.
///
/// Errors with `Validation` when the candidate name is blank, or when a
/// non-empty fetched paper list is rejected wholesale by the authorship
/// filter — both indicate a caller-correctable input problem rather than a
/// transient upstream condition.
pub fn sanitize_profile(mut raw: RawProfile, limit: usize) -> Result<RawProfile, AppError> {
    let name = raw.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("candidate name is empty".to_string()));
    }

    let fetched = raw.top_papers.len();
    let verified = filter_by_authorship(std::mem::take(&mut raw.top_papers), &name);
    if fetched > 0 && verified.is_empty() {
        return Err(AppError::Validation(format!(
            "none of the {fetched} fetched papers list {name} as an author"
        )));
    }

    let unique = dedupe_papers(verified);
    let mut papers = repair_urls(unique, &name);
    papers.truncate(limit);
    raw.top_papers = papers;
    Ok(raw)
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 1: authorship verification
// ────────────────────────────────────────────────────────────────────────────

fn filter_by_authorship(papers: Vec<Paper>, name: &str) -> Vec<Paper> {
    papers
        .into_iter()
        .filter(|paper| {
            let keep = name_matches_authors(name, &paper.authors);
            if !keep {
                debug!(
                    "dropping paper, author not found: \"{}\" (authors: {})",
                    paper.title, paper.authors
                );
            }
            keep
        })
        .collect()
}

/// Three-tier authorship check against a free-text author line.
///
/// 1. Exact full-name substring.
/// 2. Initial patterns: `lastname, F` / `F. lastname` / `F lastname`.
/// 3. Bare lastname substring, but only for surnames longer than 4 chars.
///
/// Papers failing all tiers are dropped, never repaired.
pub fn name_matches_authors(name: &str, authors: &str) -> bool {
    let name_lower = name.trim().to_lowercase();
    if name_lower.is_empty() {
        return false;
    }
    let authors_lower = authors.to_lowercase();

    if authors_lower.contains(&name_lower) {
        return true;
    }

    let parts: Vec<&str> = name_lower.split_whitespace().collect();
    let first = parts[0];
    let last = parts[parts.len() - 1];
    let Some(initial) = first.chars().next() else {
        return false;
    };

    if authors_lower.contains(&format!("{last}, {initial}"))
        || authors_lower.contains(&format!("{initial}. {last}"))
        || authors_lower.contains(&format!("{initial} {last}"))
    {
        return true;
    }

    last.chars().count() >= MIN_BARE_LASTNAME_LEN && authors_lower.contains(last)
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 2: deduplication
// ────────────────────────────────────────────────────────────────────────────

/// Keeps the first occurrence per normalized title, preserving order.
/// Idempotent by construction.
fn dedupe_papers(papers: Vec<Paper>) -> Vec<Paper> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(papers.len());
    for paper in papers {
        if seen.insert(normalized_title(&paper.title)) {
            unique.push(paper);
        } else {
            debug!("dropping duplicate paper: \"{}\"", paper.title);
        }
    }
    unique
}

/// Lowercase, strip punctuation, collapse whitespace.
fn normalized_title(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 3: URL repair
// ────────────────────────────────────────────────────────────────────────────

/// Guarantees every paper leaves with a navigable link, at the cost of that
/// link sometimes being a literature search rather than a direct citation.
fn repair_urls(papers: Vec<Paper>, name: &str) -> Vec<Paper> {
    papers
        .into_iter()
        .map(|mut paper| {
            if !is_navigable_url(&paper.url) {
                debug!("repairing URL for paper: \"{}\"", paper.title);
                paper.url = scholar_search_url(&paper.title, name);
            }
            paper
        })
        .collect()
}

/// Rejects empty URLs, generic search-results URLs, known placeholder
/// links, and anything that fails URL syntax validation.
fn is_navigable_url(url: &str) -> bool {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.contains("search?q=") || trimmed.contains("example") {
        return false;
    }
    Url::parse(trimmed).is_ok()
}

/// Deterministic fallback: a literature-search URL built from the quoted
/// title plus the candidate name.
pub fn scholar_search_url(title: &str, name: &str) -> String {
    let query = format!("\"{title}\" {name}");
    Url::parse_with_params(SCHOLAR_SEARCH_BASE, [("q", query.as_str())])
        .expect("static scholar base URL is valid")
        .to_string()
}
