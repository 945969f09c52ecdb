use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::ApplicationStatus;
use super::service::{ApplicationError, ApplicationService};
use crate::http::{error_response, AuthUser};
use crate::ids::{ApplicationId, JobId};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApplyRequest {
    #[serde(default)]
    pub(crate) cover_letter: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    pub(crate) status: ApplicationStatus,
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

pub fn application_router(service: Arc<ApplicationService>) -> Router {
    Router::new()
        .route(
            "/api/v1/jobs/:job_id/applications",
            post(apply_handler).get(job_applications_handler),
        )
        .route("/api/v1/applications", get(mine_handler))
        .route("/api/v1/applications/:application_id", get(get_handler))
        .route(
            "/api/v1/applications/:application_id/status",
            post(status_handler),
        )
        .route(
            "/api/v1/applications/:application_id/withdraw",
            post(withdraw_handler),
        )
        .with_state(service)
}

pub(crate) async fn apply_handler(
    State(service): State<Arc<ApplicationService>>,
    AuthUser(actor): AuthUser,
    Path(job_id): Path<JobId>,
    Json(request): Json<ApplyRequest>,
) -> Result<Response, ApplicationError> {
    let today = service.today();
    let application = service.apply(&actor, &job_id, &request.cover_letter, today)?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

pub(crate) async fn job_applications_handler(
    State(service): State<Arc<ApplicationService>>,
    AuthUser(actor): AuthUser,
    Path(job_id): Path<JobId>,
) -> Result<Response, ApplicationError> {
    Ok(Json(service.applications_for_job(&actor, &job_id)?).into_response())
}

pub(crate) async fn mine_handler(
    State(service): State<Arc<ApplicationService>>,
    AuthUser(actor): AuthUser,
) -> Result<Response, ApplicationError> {
    Ok(Json(service.mine(&actor)?).into_response())
}

pub(crate) async fn get_handler(
    State(service): State<Arc<ApplicationService>>,
    AuthUser(actor): AuthUser,
    Path(application_id): Path<ApplicationId>,
) -> Result<Response, ApplicationError> {
    Ok(Json(service.get(&actor, &application_id)?).into_response())
}

pub(crate) async fn status_handler(
    State(service): State<Arc<ApplicationService>>,
    AuthUser(actor): AuthUser,
    Path(application_id): Path<ApplicationId>,
    Json(request): Json<StatusRequest>,
) -> Result<Response, ApplicationError> {
    Ok(Json(service.advance(&actor, &application_id, request.status)?).into_response())
}

pub(crate) async fn withdraw_handler(
    State(service): State<Arc<ApplicationService>>,
    AuthUser(actor): AuthUser,
    Path(application_id): Path<ApplicationId>,
) -> Result<Response, ApplicationError> {
    Ok(Json(service.withdraw(&actor, &application_id)?).into_response())
}
