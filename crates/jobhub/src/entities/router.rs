use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{EntityUpdate, MemberRole, NewEntity};
use super::service::{EntityError, EntityService};
use crate::http::{error_response, AuthUser};
use crate::ids::{EntityId, UserId};

#[derive(Debug, Deserialize)]
pub(crate) struct AddMemberRequest {
    pub(crate) user_id: UserId,
    pub(crate) role: MemberRole,
}

impl IntoResponse for EntityError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

pub fn entity_router(service: Arc<EntityService>) -> Router {
    Router::new()
        .route("/api/v1/entities", post(create_handler).get(mine_handler))
        .route(
            "/api/v1/entities/:entity_id",
            get(get_handler).patch(update_handler),
        )
        .route(
            "/api/v1/entities/:entity_id/members",
            get(members_handler).post(add_member_handler),
        )
        .route(
            "/api/v1/entities/:entity_id/members/:user_id",
            delete(remove_member_handler),
        )
        .route(
            "/api/v1/admin/entities/:entity_id/verify",
            post(verify_handler),
        )
        .with_state(service)
}

pub(crate) async fn create_handler(
    State(service): State<Arc<EntityService>>,
    AuthUser(actor): AuthUser,
    Json(request): Json<NewEntity>,
) -> Result<Response, EntityError> {
    let entity = service.create(&actor, request)?;
    Ok((StatusCode::CREATED, Json(entity)).into_response())
}

pub(crate) async fn mine_handler(
    State(service): State<Arc<EntityService>>,
    AuthUser(actor): AuthUser,
) -> Result<Response, EntityError> {
    Ok(Json(service.entities_for(&actor.user_id)?).into_response())
}

pub(crate) async fn get_handler(
    State(service): State<Arc<EntityService>>,
    Path(entity_id): Path<EntityId>,
) -> Result<Response, EntityError> {
    Ok(Json(service.get(&entity_id)?).into_response())
}

pub(crate) async fn update_handler(
    State(service): State<Arc<EntityService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
    Json(update): Json<EntityUpdate>,
) -> Result<Response, EntityError> {
    Ok(Json(service.update(&actor, &entity_id, update)?).into_response())
}

pub(crate) async fn members_handler(
    State(service): State<Arc<EntityService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
) -> Result<Response, EntityError> {
    Ok(Json(service.members(&actor, &entity_id)?).into_response())
}

pub(crate) async fn add_member_handler(
    State(service): State<Arc<EntityService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
    Json(request): Json<AddMemberRequest>,
) -> Result<Response, EntityError> {
    let membership = service.add_member(&actor, &entity_id, &request.user_id, request.role)?;
    Ok((StatusCode::CREATED, Json(membership)).into_response())
}

pub(crate) async fn remove_member_handler(
    State(service): State<Arc<EntityService>>,
    AuthUser(actor): AuthUser,
    Path((entity_id, user_id)): Path<(EntityId, UserId)>,
) -> Result<Response, EntityError> {
    service.remove_member(&actor, &entity_id, &user_id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn verify_handler(
    State(service): State<Arc<EntityService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
) -> Result<Response, EntityError> {
    Ok(Json(service.verify(&actor, &entity_id)?).into_response())
}
