//! Axum route handlers for profile enrichment and listing.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::completion::MAX_PROFILE_PAPERS;
use crate::errors::AppError;
use crate::models::candidate::StoredProfile;
use crate::models::matching::Citation;
use crate::profile::sanitize::sanitize_profile;
use crate::state::AppState;
use crate::store::ProfileDraft;

pub const DEFAULT_PAPER_LIMIT: usize = 10;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EnrichQuery {
    pub name: String,
    pub affiliation: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EnrichResponse {
    pub success: bool,
    pub data: StoredProfile,
    pub citations: Vec<Citation>,
    pub metadata: EnrichMeta,
}

#[derive(Debug, Serialize)]
pub struct EnrichMeta {
    pub model: String,
    pub requested_limit: usize,
    pub verified_papers: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ResearcherListResponse {
    pub researchers: Vec<StoredProfile>,
    pub count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/researcher/profile?name=<name>&affiliation=<affiliation>&limit=<limit>
///
/// Fetches a researcher profile through the completion gateway, sanitizes
/// it, and persists the result. There is deliberately no fallback on this
/// path: upstream and parse failures surface to the caller with their raw
/// diagnostic detail, because a fabricated profile presented as fact is
/// worse than an explicit failure.
pub async fn handle_enrich_profile(
    State(state): State<AppState>,
    Query(params): Query<EnrichQuery>,
) -> Result<Json<EnrichResponse>, AppError> {
    let name = params.name.trim().to_string();
    let affiliation = params.affiliation.trim().to_string();
    if name.is_empty() || affiliation.is_empty() {
        return Err(AppError::Validation(
            "both name and affiliation are required".to_string(),
        ));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAPER_LIMIT)
        .clamp(1, MAX_PROFILE_PAPERS);

    info!("fetching researcher profile: {name} at {affiliation} (limit: {limit} papers)");
    let raw = state.gateway.fetch_profile(&name, &affiliation, limit).await?;
    info!("received {} papers from completion service", raw.top_papers.len());

    let sanitized = sanitize_profile(raw, limit)?;
    info!(
        "{} verified papers after sanitization (requested limit: {limit})",
        sanitized.top_papers.len()
    );

    let verified_papers = sanitized.top_papers.len();
    let citations = sanitized.citations.clone();
    let stored = state.store.upsert(ProfileDraft {
        name: sanitized.name,
        affiliation: sanitized.affiliation,
        summary: sanitized.summary,
        top_papers: sanitized.top_papers,
    });

    Ok(Json(EnrichResponse {
        success: true,
        data: stored,
        citations,
        metadata: EnrichMeta {
            model: state.config.completion_model.clone(),
            requested_limit: limit,
            verified_papers,
            timestamp: Utc::now(),
        },
    }))
}

/// GET /api/researchers
/// Lists stored profiles, most recently updated first.
pub async fn handle_list_researchers(
    State(state): State<AppState>,
) -> Json<ResearcherListResponse> {
    let researchers = state.store.get_all();
    let count = researchers.len();
    Json(ResearcherListResponse { researchers, count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    use crate::completion::{CompletionError, CompletionGateway};
    use crate::config::Config;
    use crate::models::candidate::Paper;
    use crate::models::matching::{
        CandidateContext, CandidateDoc, MatchResult, QaResult, RawProfile, SearchResult,
    };
    use crate::store::ProfileStore;

    /// Gateway whose `fetch_profile` either fails to parse or returns a
    /// fixed raw profile.
    struct ProfileGateway {
        reply: Result<RawProfile, ()>,
    }

    #[async_trait]
    impl CompletionGateway for ProfileGateway {
        async fn match_candidate_to_job(
            &self,
            _doc: &CandidateDoc,
            _job_text: &str,
        ) -> Result<MatchResult, CompletionError> {
            unimplemented!("not used by profile handlers")
        }

        async fn answer_question(
            &self,
            _question: &str,
            _context: &CandidateContext,
        ) -> Result<QaResult, CompletionError> {
            unimplemented!("not used by profile handlers")
        }

        async fn search_literature(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<SearchResult, CompletionError> {
            unimplemented!("not used by profile handlers")
        }

        async fn fetch_profile(
            &self,
            _name: &str,
            _affiliation: &str,
            _paper_limit: usize,
        ) -> Result<RawProfile, CompletionError> {
            match &self.reply {
                Ok(profile) => Ok(profile.clone()),
                Err(()) => Err(CompletionError::parse(
                    "I could not find that researcher, sorry.",
                )),
            }
        }
    }

    fn test_state(reply: Result<RawProfile, ()>) -> AppState {
        AppState {
            store: ProfileStore::new(),
            gateway: Arc::new(ProfileGateway { reply }),
            config: Config {
                completion_api_key: "test-key".to_string(),
                completion_model: "sonar-pro".to_string(),
                completion_base_url: "http://localhost:0".to_string(),
                completion_max_tokens: 2000,
                cache_ttl_minutes: 30,
                port: 0,
                rust_log: "info".to_string(),
            },
        }
    }

    fn query(name: &str, affiliation: &str, limit: Option<usize>) -> Query<EnrichQuery> {
        Query(EnrichQuery {
            name: name.to_string(),
            affiliation: affiliation.to_string(),
            limit,
        })
    }

    #[tokio::test]
    async fn test_unparseable_reply_surfaces_error_and_persists_nothing() {
        let state = test_state(Err(()));
        let result =
            handle_enrich_profile(State(state.clone()), query("Jane Doe", "MIT", None)).await;

        let err = result.err().expect("expected enrichment to fail");
        assert!(matches!(err, AppError::Parse(_)));
        // Diagnostic detail is preserved for the caller.
        assert!(err.to_string().contains("could not find that researcher"));
        assert_eq!(state.store.count(), 0);
    }

    #[tokio::test]
    async fn test_successful_fetch_is_sanitized_and_persisted() {
        let raw = RawProfile {
            name: "Jane Doe".to_string(),
            affiliation: "MIT".to_string(),
            summary: "Researches ML.".to_string(),
            top_papers: vec![
                Paper {
                    title: "Hers".to_string(),
                    authors: "J. Doe, A. Colleague".to_string(),
                    abstract_text: "abs".to_string(),
                    url: String::new(),
                    year: None,
                },
                Paper {
                    title: "Not Hers".to_string(),
                    authors: "Q. Unrelated".to_string(),
                    abstract_text: "abs".to_string(),
                    url: String::new(),
                    year: None,
                },
            ],
            citations: vec![],
        };
        let state = test_state(Ok(raw));

        let response = handle_enrich_profile(State(state.clone()), query("Jane Doe", "MIT", None))
            .await
            .expect("enrichment should succeed");

        assert_eq!(response.0.data.top_papers.len(), 1);
        assert_eq!(response.0.data.top_papers[0].title, "Hers");
        // Repaired URL is navigable.
        assert!(response.0.data.top_papers[0].url.starts_with("https://"));
        assert_eq!(state.store.count(), 1);
        assert!(state.store.get("Jane Doe", "MIT").is_some());
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected_before_any_fetch() {
        let state = test_state(Err(()));
        let result = handle_enrich_profile(State(state), query("   ", "MIT", None)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
