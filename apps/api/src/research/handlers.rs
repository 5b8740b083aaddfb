//! Axum route handlers for candidate Q&A and open literature search.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::matching::fallback::{fallback_qa, fallback_search};
use crate::models::matching::{CandidateContext, QaResult, SearchResult};
use crate::state::AppState;

const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 20;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QaRequest {
    pub question: String,
    pub researcher: CandidateContext,
}

#[derive(Debug, Serialize)]
pub struct QaResponse {
    pub success: bool,
    pub question: String,
    pub researcher_name: String,
    pub answer: QaResult,
    pub metadata: ResearchMeta,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub results: SearchResult,
    pub metadata: ResearchMeta,
}

#[derive(Debug, Serialize)]
pub struct ResearchMeta {
    pub used_fallback: bool,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/researcher/qa
///
/// Answers a free-form question about a candidate. Upstream or parse
/// failures degrade to the deterministic QA fallback, flagged in metadata.
pub async fn handle_qa(
    State(state): State<AppState>,
    Json(req): Json<QaRequest>,
) -> Result<Json<QaResponse>, AppError> {
    if req.question.trim().is_empty() {
        return Err(AppError::Validation("question is required".to_string()));
    }
    if req.researcher.name.trim().is_empty() {
        return Err(AppError::Validation(
            "researcher.name is required".to_string(),
        ));
    }

    let answer = match state
        .gateway
        .answer_question(&req.question, &req.researcher)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            warn!("Q&A failed, using fallback generator: {e}");
            fallback_qa(&req.question, &req.researcher)
        }
    };

    let metadata = research_meta(&state, answer.used_fallback);
    Ok(Json(QaResponse {
        success: true,
        question: req.question,
        researcher_name: req.researcher.name,
        answer,
        metadata,
    }))
}

/// GET /api/search?q=<query>&limit=<limit>
///
/// Open literature search. Relevance scores in the results are
/// upstream-assigned hints, not trusted rankings.
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.trim().to_string();
    if query.is_empty() {
        return Err(AppError::Validation("q is required".to_string()));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let results = match state.gateway.search_literature(&query, limit).await {
        Ok(result) => result,
        Err(e) => {
            warn!("search failed, using fallback generator: {e}");
            fallback_search(&query)
        }
    };

    let metadata = research_meta(&state, results.used_fallback);
    Ok(Json(SearchResponse {
        success: true,
        query,
        results,
        metadata,
    }))
}

fn research_meta(state: &AppState, used_fallback: bool) -> ResearchMeta {
    ResearchMeta {
        used_fallback,
        model: if used_fallback {
            "fallback".to_string()
        } else {
            state.config.completion_model.clone()
        },
        timestamp: Utc::now(),
    }
}
