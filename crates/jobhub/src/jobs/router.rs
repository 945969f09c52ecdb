use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::JobDraft;
use super::import::ImportError;
use super::query::JobQuery;
use super::service::{JobError, JobService};
use crate::http::{error_response, AuthUser};
use crate::ids::{EntityId, JobId};

#[derive(Debug, Deserialize)]
pub(crate) struct SponsorRequest {
    pub(crate) days: u32,
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            JobError::Import(ImportError::Rows(rows)) => (
                status,
                Json(json!({
                    "error": format!("{} row(s) rejected", rows.len()),
                    "rows": rows,
                })),
            )
                .into_response(),
            other => error_response(status, other.to_string()),
        }
    }
}

pub fn job_router(service: Arc<JobService>) -> Router {
    Router::new()
        .route(
            "/api/v1/entities/:entity_id/jobs",
            post(create_handler).get(entity_jobs_handler),
        )
        .route(
            "/api/v1/entities/:entity_id/jobs/import",
            post(import_handler),
        )
        .route("/api/v1/jobs", get(listing_handler))
        .route("/api/v1/jobs/:job_id", get(view_handler).put(update_handler))
        .route("/api/v1/jobs/:job_id/publish", post(publish_handler))
        .route("/api/v1/jobs/:job_id/pause", post(pause_handler))
        .route("/api/v1/jobs/:job_id/resume", post(resume_handler))
        .route("/api/v1/jobs/:job_id/close", post(close_handler))
        .route("/api/v1/jobs/:job_id/renew", post(renew_handler))
        .route("/api/v1/jobs/:job_id/sponsor", post(sponsor_handler))
        .with_state(service)
}

pub(crate) async fn create_handler(
    State(service): State<Arc<JobService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
    Json(draft): Json<JobDraft>,
) -> Result<Response, JobError> {
    let job = service.create_draft(&actor, &entity_id, draft)?;
    Ok((StatusCode::CREATED, Json(job)).into_response())
}

pub(crate) async fn entity_jobs_handler(
    State(service): State<Arc<JobService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
) -> Result<Response, JobError> {
    Ok(Json(service.jobs_for_entity(&actor, &entity_id)?).into_response())
}

/// Accepts the raw CSV document as the request body.
pub(crate) async fn import_handler(
    State(service): State<Arc<JobService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
    body: String,
) -> Result<Response, JobError> {
    let jobs = service.import_csv(&actor, &entity_id, body.as_bytes())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "imported": jobs.len(), "jobs": jobs })),
    )
        .into_response())
}

pub(crate) async fn listing_handler(
    State(service): State<Arc<JobService>>,
    Query(query): Query<JobQuery>,
) -> Result<Response, JobError> {
    let today = service.today();
    Ok(Json(service.public_listing(&query, today)?).into_response())
}

pub(crate) async fn view_handler(
    State(service): State<Arc<JobService>>,
    viewer: Option<AuthUser>,
    Path(job_id): Path<JobId>,
) -> Result<Response, JobError> {
    let today = service.today();
    let viewer = viewer.map(|AuthUser(user)| user);
    Ok(Json(service.view(viewer.as_ref(), &job_id, today)?).into_response())
}

pub(crate) async fn update_handler(
    State(service): State<Arc<JobService>>,
    AuthUser(actor): AuthUser,
    Path(job_id): Path<JobId>,
    Json(draft): Json<JobDraft>,
) -> Result<Response, JobError> {
    Ok(Json(service.update(&actor, &job_id, draft)?).into_response())
}

pub(crate) async fn publish_handler(
    State(service): State<Arc<JobService>>,
    AuthUser(actor): AuthUser,
    Path(job_id): Path<JobId>,
) -> Result<Response, JobError> {
    let today = service.today();
    Ok(Json(service.publish(&actor, &job_id, today)?).into_response())
}

pub(crate) async fn pause_handler(
    State(service): State<Arc<JobService>>,
    AuthUser(actor): AuthUser,
    Path(job_id): Path<JobId>,
) -> Result<Response, JobError> {
    Ok(Json(service.pause(&actor, &job_id)?).into_response())
}

pub(crate) async fn resume_handler(
    State(service): State<Arc<JobService>>,
    AuthUser(actor): AuthUser,
    Path(job_id): Path<JobId>,
) -> Result<Response, JobError> {
    let today = service.today();
    Ok(Json(service.resume(&actor, &job_id, today)?).into_response())
}

pub(crate) async fn close_handler(
    State(service): State<Arc<JobService>>,
    AuthUser(actor): AuthUser,
    Path(job_id): Path<JobId>,
) -> Result<Response, JobError> {
    let today = service.today();
    Ok(Json(service.close(&actor, &job_id, today)?).into_response())
}

pub(crate) async fn renew_handler(
    State(service): State<Arc<JobService>>,
    AuthUser(actor): AuthUser,
    Path(job_id): Path<JobId>,
) -> Result<Response, JobError> {
    let today = service.today();
    Ok(Json(service.renew(&actor, &job_id, today)?).into_response())
}

pub(crate) async fn sponsor_handler(
    State(service): State<Arc<JobService>>,
    AuthUser(actor): AuthUser,
    Path(job_id): Path<JobId>,
    Json(request): Json<SponsorRequest>,
) -> Result<Response, JobError> {
    let today = service.today();
    Ok(Json(service.sponsor(&actor, &job_id, request.days, today)?).into_response())
}
