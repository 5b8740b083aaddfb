pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers as matching_handlers;
use crate::profile::handlers as profile_handlers;
use crate::research::handlers as research_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching
        .route("/api/match", post(matching_handlers::handle_match_one))
        .route(
            "/api/recruiter/match",
            post(matching_handlers::handle_match_all),
        )
        // Profile enrichment
        .route(
            "/api/researcher/profile",
            get(profile_handlers::handle_enrich_profile),
        )
        .route(
            "/api/researchers",
            get(profile_handlers::handle_list_researchers),
        )
        // Q&A + search
        .route("/api/researcher/qa", post(research_handlers::handle_qa))
        .route("/api/search", get(research_handlers::handle_search))
        .with_state(state)
}
