use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::service::{BillingError, BillingService};
use crate::http::{error_response, AuthUser};
use crate::ids::EntityId;

#[derive(Debug, Deserialize)]
pub(crate) struct PurchaseRequest {
    pub(crate) plan_code: String,
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

pub fn billing_router(service: Arc<BillingService>) -> Router {
    Router::new()
        .route("/api/v1/billing/plans", get(plans_handler))
        .route(
            "/api/v1/entities/:entity_id/billing/wallet",
            get(wallet_handler),
        )
        .route(
            "/api/v1/entities/:entity_id/billing/subscription",
            get(subscription_handler),
        )
        .route(
            "/api/v1/entities/:entity_id/billing/orders",
            get(orders_handler),
        )
        .route(
            "/api/v1/entities/:entity_id/billing/purchase",
            post(purchase_handler),
        )
        .with_state(service)
}

pub(crate) async fn plans_handler(State(service): State<Arc<BillingService>>) -> Response {
    Json(service.catalog()).into_response()
}

pub(crate) async fn wallet_handler(
    State(service): State<Arc<BillingService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
) -> Result<Response, BillingError> {
    Ok(Json(service.wallet(&actor, &entity_id)?).into_response())
}

pub(crate) async fn subscription_handler(
    State(service): State<Arc<BillingService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
) -> Result<Response, BillingError> {
    Ok(Json(service.subscription(&actor, &entity_id)?).into_response())
}

pub(crate) async fn orders_handler(
    State(service): State<Arc<BillingService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
) -> Result<Response, BillingError> {
    Ok(Json(service.orders(&actor, &entity_id)?).into_response())
}

pub(crate) async fn purchase_handler(
    State(service): State<Arc<BillingService>>,
    AuthUser(actor): AuthUser,
    Path(entity_id): Path<EntityId>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Response, BillingError> {
    let order = service.purchase(&actor, &entity_id, &request.plan_code)?;
    Ok((StatusCode::CREATED, Json(order)).into_response())
}
