//! Fan-out orchestrator — concurrent per-candidate matching with
//! independent failure handling.
//!
//! Every candidate settles into a tagged outcome: ranked, or failed with the
//! reason it was excluded. One candidate's failure never aborts the batch,
//! and all settlements are collected before ranking — no partial emission.

use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::completion::CompletionGateway;
use crate::matching::engine::{match_document, portfolio_doc, profile_context};
use crate::matching::fallback::{candidate_text, fallback_match, fallback_qa};
use crate::models::candidate::StoredProfile;
use crate::models::matching::Citation;

/// The concise skill-extraction question run alongside each match call.
const SKILLS_QUESTION: &str =
    "List only the top 5-7 most relevant technical skills and research areas from this \
    researcher's work. Be concise: 3-5 words per item, no explanations, just skill names.";

#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch {
    pub researcher: StoredProfile,
    pub score: u8,
    pub alignment: Vec<String>,
    pub gaps: Vec<String>,
    pub relevance: String,
    pub extracted_skills: String,
    pub citations: Vec<Citation>,
    pub used_fallback: bool,
}

/// Why a candidate was excluded from the ranking.
#[derive(Debug, Clone, Serialize)]
pub struct MatchFailure {
    pub candidate_id: String,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct FanOutReport {
    pub matches: Vec<RankedMatch>,
    pub failures: Vec<MatchFailure>,
    pub total_analyzed: usize,
}

/// Matches every profile against the job description concurrently.
///
/// No concurrency cap: the candidate set is expected to be tens, not
/// thousands. Survivors are sorted by score descending; the sort is stable,
/// so ties keep their input order (which callers must not rely on across
/// runs, since upstream scores are non-deterministic).
pub async fn match_all(
    gateway: &dyn CompletionGateway,
    profiles: Vec<StoredProfile>,
    job_text: &str,
) -> FanOutReport {
    let total_analyzed = profiles.len();
    let outcomes = join_all(
        profiles
            .iter()
            .map(|profile| match_one_candidate(gateway, profile, job_text)),
    )
    .await;

    let mut matches = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(ranked) => matches.push(ranked),
            Err(failure) => {
                warn!(
                    "excluding candidate {} from ranking: {}",
                    failure.candidate_id, failure.reason
                );
                failures.push(failure);
            }
        }
    }

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    FanOutReport {
        matches,
        failures,
        total_analyzed,
    }
}

async fn match_one_candidate(
    gateway: &dyn CompletionGateway,
    profile: &StoredProfile,
    job_text: &str,
) -> Result<RankedMatch, MatchFailure> {
    let doc = portfolio_doc(profile);
    let context = profile_context(profile);

    let (skills_outcome, match_outcome) = tokio::join!(
        gateway.answer_question(SKILLS_QUESTION, &context),
        match_document(gateway, &doc, job_text),
    );

    let result = match match_outcome {
        Ok(result) => result,
        // The reply arrived but was garbage: degrade to the deterministic
        // generator rather than dropping the candidate.
        Err(e) if e.is_parse() => fallback_match(&candidate_text(&doc), job_text),
        // Upstream unreachable for this candidate: exclude it, keep the batch.
        Err(e) => {
            return Err(MatchFailure {
                candidate_id: profile.id.clone(),
                name: profile.name.clone(),
                reason: e.to_string(),
            })
        }
    };

    let extracted_skills = match skills_outcome {
        Ok(qa) => qa.answer,
        Err(_) => fallback_qa(SKILLS_QUESTION, &context).answer,
    };

    Ok(RankedMatch {
        researcher: profile.clone(),
        score: result.score,
        alignment: result.alignment,
        gaps: result.gaps,
        relevance: result.relevance,
        extracted_skills,
        citations: result.citations,
        used_fallback: result.used_fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;

    use crate::completion::CompletionError;
    use crate::models::matching::{
        CandidateContext, CandidateDoc, Confidence, MatchResult, QaResult, RawProfile,
        SearchResult,
    };

    /// Scripted gateway: per-candidate behavior keyed by candidate name.
    #[derive(Clone, Copy)]
    enum Behavior {
        Score(u8),
        Unavailable,
        Garbage,
    }

    struct ScriptedGateway {
        behaviors: HashMap<String, Behavior>,
    }

    impl ScriptedGateway {
        fn new(entries: &[(&str, Behavior)]) -> Self {
            ScriptedGateway {
                behaviors: entries
                    .iter()
                    .map(|(name, b)| (name.to_string(), *b))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl CompletionGateway for ScriptedGateway {
        async fn match_candidate_to_job(
            &self,
            doc: &CandidateDoc,
            _job_text: &str,
        ) -> Result<MatchResult, CompletionError> {
            match self.behaviors.get(&doc.authors) {
                Some(Behavior::Score(score)) => Ok(MatchResult {
                    score: *score,
                    alignment: vec!["scripted alignment".to_string()],
                    gaps: vec![],
                    relevance: "scripted".to_string(),
                    citations: vec![],
                    used_fallback: false,
                }),
                Some(Behavior::Unavailable) => Err(CompletionError::Api {
                    status: 503,
                    message: "service unavailable".to_string(),
                }),
                Some(Behavior::Garbage) => Err(CompletionError::parse("I cannot answer that.")),
                None => panic!("no scripted behavior for {}", doc.authors),
            }
        }

        async fn answer_question(
            &self,
            _question: &str,
            _context: &CandidateContext,
        ) -> Result<QaResult, CompletionError> {
            Ok(QaResult {
                answer: "Deep Learning; Optimization".to_string(),
                confidence: Confidence::High,
                sources: vec![],
                citations: vec![],
                used_fallback: false,
            })
        }

        async fn search_literature(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<SearchResult, CompletionError> {
            Ok(SearchResult {
                papers: vec![],
                citations: vec![],
                used_fallback: false,
            })
        }

        async fn fetch_profile(
            &self,
            _name: &str,
            _affiliation: &str,
            _paper_limit: usize,
        ) -> Result<RawProfile, CompletionError> {
            Err(CompletionError::Api {
                status: 503,
                message: "not scripted".to_string(),
            })
        }
    }

    fn profile(name: &str) -> StoredProfile {
        StoredProfile {
            id: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            affiliation: "Test University".to_string(),
            summary: "Researches research.".to_string(),
            top_papers: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_failures_exclude_candidates_without_aborting_batch() {
        let gateway = ScriptedGateway::new(&[
            ("Alice One", Behavior::Score(80)),
            ("Bob Two", Behavior::Unavailable),
            ("Carol Three", Behavior::Score(60)),
            ("Dave Four", Behavior::Unavailable),
        ]);
        let profiles = vec![
            profile("Alice One"),
            profile("Bob Two"),
            profile("Carol Three"),
            profile("Dave Four"),
        ];

        let report = match_all(&gateway, profiles, "some job").await;

        // N=4, M=2 failures: exactly N−M ranked results.
        assert_eq!(report.matches.len(), 2);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.total_analyzed, 4);
        let failed: Vec<&str> = report
            .failures
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert!(failed.contains(&"Bob Two"));
        assert!(failed.contains(&"Dave Four"));
        assert!(report.failures[0].reason.contains("503"));
    }

    #[tokio::test]
    async fn test_results_sorted_by_score_descending() {
        let gateway = ScriptedGateway::new(&[
            ("Low Scorer", Behavior::Score(55)),
            ("High Scorer", Behavior::Score(91)),
            ("Mid Scorer", Behavior::Score(72)),
        ]);
        let profiles = vec![
            profile("Low Scorer"),
            profile("High Scorer"),
            profile("Mid Scorer"),
        ];

        let report = match_all(&gateway, profiles, "some job").await;
        let scores: Vec<u8> = report.matches.iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![91, 72, 55]);
    }

    #[tokio::test]
    async fn test_garbage_reply_masked_by_fallback_not_excluded() {
        let gateway = ScriptedGateway::new(&[("Alice One", Behavior::Garbage)]);
        let report = match_all(&gateway, vec![profile("Alice One")], "deep learning role").await;

        assert_eq!(report.matches.len(), 1);
        assert!(report.failures.is_empty());
        assert!(report.matches[0].used_fallback);
        assert!(report.matches[0].score >= crate::matching::fallback::BASE_SCORE);
    }

    #[tokio::test]
    async fn test_empty_candidate_set_yields_empty_report() {
        let gateway = ScriptedGateway::new(&[]);
        let report = match_all(&gateway, vec![], "some job").await;
        assert!(report.matches.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(report.total_analyzed, 0);
    }

    #[tokio::test]
    async fn test_skills_ride_along_on_ranked_match() {
        let gateway = ScriptedGateway::new(&[("Alice One", Behavior::Score(70))]);
        let report = match_all(&gateway, vec![profile("Alice One")], "some job").await;
        assert_eq!(report.matches[0].extracted_skills, "Deep Learning; Optimization");
    }
}
