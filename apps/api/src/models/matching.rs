use serde::{Deserialize, Serialize};

use crate::models::candidate::Paper;

/// Provenance metadata attached opportunistically by the completion service.
/// Absence is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Citation {
    pub fn bare(url: impl Into<String>) -> Self {
        Citation {
            url: url.into(),
            title: None,
        }
    }

    pub fn titled(url: impl Into<String>, title: impl Into<String>) -> Self {
        Citation {
            url: url.into(),
            title: Some(title.into()),
        }
    }
}

/// Outcome of scoring one candidate (paper or whole profile) against a job
/// description. The score is advisory: the upstream reasoning is
/// non-deterministic, so repeated calls may disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: u8,
    pub alignment: Vec<String>,
    pub gaps: Vec<String>,
    pub relevance: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    /// True when the deterministic fallback generator produced this result
    /// instead of the completion service.
    #[serde(default)]
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    /// Lenient decoding of the upstream's confidence string.
    /// Anything unrecognized degrades to `medium`.
    pub fn from_loose(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" => Confidence::High,
            "low" => Confidence::Low,
            _ => Confidence::Medium,
        }
    }
}

/// Answer to a free-form question about a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaResult {
    pub answer: String,
    pub confidence: Confidence,
    pub sources: Vec<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub used_fallback: bool,
}

/// A paper returned by open literature search. `relevance` is assigned
/// upstream and untrusted — treat it as a hint only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundPaper {
    pub title: String,
    #[serde(default)]
    pub authors: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub relevance: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub papers: Vec<FoundPaper>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub used_fallback: bool,
}

/// A fetched researcher profile before sanitization. Must never be persisted
/// or shown without passing through the sanitizer first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProfile {
    pub name: String,
    pub affiliation: String,
    pub summary: String,
    pub top_papers: Vec<Paper>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// The synthetic document handed to the matching operation: either an inline
/// paper or a whole profile collapsed into one abstract-like submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDoc {
    pub title: String,
    #[serde(default)]
    pub authors: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Candidate context for question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateContext {
    pub name: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub papers: Vec<ContextPaper>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPaper {
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_from_loose_known_values() {
        assert_eq!(Confidence::from_loose("High"), Confidence::High);
        assert_eq!(Confidence::from_loose(" low "), Confidence::Low);
        assert_eq!(Confidence::from_loose("medium"), Confidence::Medium);
    }

    #[test]
    fn test_confidence_from_loose_unknown_degrades_to_medium() {
        assert_eq!(Confidence::from_loose("very sure"), Confidence::Medium);
        assert_eq!(Confidence::from_loose(""), Confidence::Medium);
    }

    #[test]
    fn test_confidence_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Confidence::High).unwrap(),
            r#""high""#
        );
    }

    #[test]
    fn test_match_result_round_trips_through_json() {
        let result = MatchResult {
            score: 88,
            alignment: vec!["a".to_string()],
            gaps: vec![],
            relevance: "fits".to_string(),
            citations: vec![Citation::bare("https://arxiv.org")],
            used_fallback: false,
        };
        let value = serde_json::to_value(&result).unwrap();
        let back: MatchResult = serde_json::from_value(value).unwrap();
        assert_eq!(back.score, 88);
        assert_eq!(back.citations.len(), 1);
    }
}
