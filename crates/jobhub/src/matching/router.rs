use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::filter::CandidateFilter;
use super::service::{CandidateSearchService, MatchingError};
use crate::http::{error_response, AuthUser};
use crate::ids::{EntityId, JobId};

impl IntoResponse for MatchingError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

pub fn matching_router(service: Arc<CandidateSearchService>) -> Router {
    Router::new()
        .route(
            "/api/v1/entities/:entity_id/candidates/search",
            post(search_handler),
        )
        .route("/api/v1/jobs/:job_id/candidates", get(job_candidates_handler))
        .route(
            "/api/v1/profile/recommendations",
            get(recommendations_handler),
        )
        .with_state(service)
}

pub(crate) async fn search_handler(
    State(service): State<Arc<CandidateSearchService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
    Json(filter): Json<CandidateFilter>,
) -> Result<Response, MatchingError> {
    Ok(Json(service.search(&actor, &entity_id, &filter)?).into_response())
}

pub(crate) async fn job_candidates_handler(
    State(service): State<Arc<CandidateSearchService>>,
    AuthUser(actor): AuthUser,
    Path(job_id): Path<JobId>,
) -> Result<Response, MatchingError> {
    Ok(Json(service.candidates_for_job(&actor, &job_id)?).into_response())
}

pub(crate) async fn recommendations_handler(
    State(service): State<Arc<CandidateSearchService>>,
    AuthUser(actor): AuthUser,
) -> Result<Response, MatchingError> {
    Ok(Json(service.recommendations(&actor)?).into_response())
}
