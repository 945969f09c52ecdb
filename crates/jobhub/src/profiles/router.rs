use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::ProfileDraft;
use super::service::{ProfileError, ProfileService};
use crate::http::{error_response, AuthUser};
use crate::ids::UserId;

#[derive(Debug, Deserialize)]
pub(crate) struct OpenToWorkRequest {
    pub(crate) open: bool,
}

impl IntoResponse for ProfileError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

pub fn profile_router(service: Arc<ProfileService>) -> Router {
    Router::new()
        .route("/api/v1/profile", get(mine_handler).put(upsert_handler))
        .route("/api/v1/profile/open-to-work", post(open_to_work_handler))
        .route("/api/v1/profiles/:user_id", get(view_handler))
        .with_state(service)
}

pub(crate) async fn mine_handler(
    State(service): State<Arc<ProfileService>>,
    AuthUser(actor): AuthUser,
) -> Result<Response, ProfileError> {
    Ok(Json(service.mine(&actor)?).into_response())
}

pub(crate) async fn upsert_handler(
    State(service): State<Arc<ProfileService>>,
    AuthUser(actor): AuthUser,
    Json(draft): Json<ProfileDraft>,
) -> Result<Response, ProfileError> {
    Ok(Json(service.upsert(&actor, draft)?).into_response())
}

pub(crate) async fn open_to_work_handler(
    State(service): State<Arc<ProfileService>>,
    AuthUser(actor): AuthUser,
    Json(request): Json<OpenToWorkRequest>,
) -> Result<Response, ProfileError> {
    Ok(Json(service.set_open_to_work(&actor, request.open)?).into_response())
}

pub(crate) async fn view_handler(
    State(service): State<Arc<ProfileService>>,
    AuthUser(viewer): AuthUser,
    Path(user_id): Path<UserId>,
) -> Result<Response, ProfileError> {
    Ok(Json(service.get(&viewer, &user_id)?).into_response())
}
