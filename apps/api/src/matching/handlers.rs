//! Axum route handlers for the matching API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::matching::engine::{match_document, portfolio_doc};
use crate::matching::fallback::{candidate_text, fallback_match};
use crate::matching::fanout::{match_all, MatchFailure, RankedMatch};
use crate::models::matching::{CandidateDoc, MatchResult};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchOneRequest {
    pub job_requirements: String,
    /// Inline paper to score. Exactly one of `paper` / `candidate_id` is
    /// required.
    #[serde(default)]
    pub paper: Option<PaperInput>,
    /// Id of a stored profile to score as a portfolio.
    #[serde(default)]
    pub candidate_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaperInput {
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub used_fallback: bool,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MatchOneResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<String>,
    #[serde(rename = "match")]
    pub match_result: MatchResult,
    pub metadata: ResponseMeta,
}

#[derive(Debug, Deserialize)]
pub struct MatchAllRequest {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct MatchAllResponse {
    pub success: bool,
    pub matches: Vec<RankedMatch>,
    pub total_analyzed: usize,
    /// Candidates excluded from the ranking, with the reason each one
    /// failed — surfaced for telemetry, not hidden.
    pub failures: Vec<MatchFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub metadata: ResponseMeta,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/match
///
/// Scores one candidate — an inline paper or a stored profile — against the
/// given job requirements. Upstream or parse failures are masked by the
/// deterministic fallback generator and flagged in the response metadata.
pub async fn handle_match_one(
    State(state): State<AppState>,
    Json(req): Json<MatchOneRequest>,
) -> Result<Json<MatchOneResponse>, AppError> {
    if req.job_requirements.trim().is_empty() {
        return Err(AppError::Validation(
            "job_requirements is required".to_string(),
        ));
    }

    let doc = match (&req.paper, &req.candidate_id) {
        (Some(paper), _) => CandidateDoc {
            title: paper.title.clone(),
            authors: paper.authors.clone(),
            abstract_text: paper.abstract_text.clone(),
            topics: paper.topics.clone(),
        },
        (None, Some(id)) => {
            let profile = state
                .store
                .get_by_id(id)
                .ok_or_else(|| AppError::NotFound(format!("candidate {id} not found")))?;
            portfolio_doc(&profile)
        }
        (None, None) => {
            return Err(AppError::Validation(
                "either paper or candidate_id is required".to_string(),
            ));
        }
    };

    let match_result = match match_document(state.gateway.as_ref(), &doc, &req.job_requirements).await
    {
        Ok(result) => result,
        Err(e) => {
            warn!("match failed, using fallback generator: {e}");
            fallback_match(&candidate_text(&doc), &req.job_requirements)
        }
    };

    let metadata = response_meta(&state, match_result.used_fallback);
    Ok(Json(MatchOneResponse {
        success: true,
        candidate_id: req.candidate_id,
        match_result,
        metadata,
    }))
}

/// POST /api/recruiter/match
///
/// Fans out over every stored profile concurrently and returns the ranked
/// survivors. Per-candidate failures are reported, never fatal.
pub async fn handle_match_all(
    State(state): State<AppState>,
    Json(req): Json<MatchAllRequest>,
) -> Result<Json<MatchAllResponse>, AppError> {
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description is required".to_string(),
        ));
    }

    let profiles = state.store.get_all();
    if profiles.is_empty() {
        return Ok(Json(MatchAllResponse {
            success: true,
            matches: vec![],
            total_analyzed: 0,
            failures: vec![],
            message: Some(
                "No researchers in the store. Enrich profiles first via \
                /api/researcher/profile."
                    .to_string(),
            ),
            metadata: response_meta(&state, false),
        }));
    }

    info!(
        "matching {} researchers against job description",
        profiles.len()
    );
    let report = match_all(state.gateway.as_ref(), profiles, &req.job_description).await;
    info!(
        "ranked {} of {} researchers ({} excluded)",
        report.matches.len(),
        report.total_analyzed,
        report.failures.len()
    );

    let any_fallback = report.matches.iter().any(|m| m.used_fallback);
    Ok(Json(MatchAllResponse {
        success: true,
        matches: report.matches,
        total_analyzed: report.total_analyzed,
        failures: report.failures,
        message: None,
        metadata: response_meta(&state, any_fallback),
    }))
}

fn response_meta(state: &AppState, used_fallback: bool) -> ResponseMeta {
    ResponseMeta {
        used_fallback,
        model: if used_fallback {
            "fallback".to_string()
        } else {
            state.config.completion_model.clone()
        },
        timestamp: Utc::now(),
    }
}
