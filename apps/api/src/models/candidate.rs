use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single publication attributed to a candidate.
///
/// `authors` is the free-text author line as printed on the paper, not a
/// structured list — the sanitizer matches candidate names against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

/// A researcher profile as held by the profile store.
/// Superseded (not merged) on re-fetch; `created_at` survives the supersede.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub id: String,
    pub name: String,
    pub affiliation: String,
    pub summary: String,
    pub top_papers: Vec<Paper>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity key for a profile: lowercased name and affiliation with
/// whitespace collapsed, joined with an underscore. Structurally-equal
/// inputs must always produce the same key.
pub fn profile_key(name: &str, affiliation: &str) -> String {
    format!("{}_{}", slug(name), slug(affiliation))
}

fn slug(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
