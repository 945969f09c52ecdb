use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::service::{MessagingError, MessagingService};
use crate::http::{error_response, AuthUser};
use crate::ids::{ConversationId, UserId};

#[derive(Debug, Deserialize)]
pub(crate) struct SendRequest {
    pub(crate) recipient: UserId,
    pub(crate) body: String,
}

impl IntoResponse for MessagingError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.to_string())
    }
}

pub fn messaging_router(service: Arc<MessagingService>) -> Router {
    Router::new()
        .route("/api/v1/messages", post(send_handler))
        .route("/api/v1/conversations", get(conversations_handler))
        .route(
            "/api/v1/conversations/:conversation_id",
            get(messages_handler),
        )
        .with_state(service)
}

pub(crate) async fn send_handler(
    State(service): State<Arc<MessagingService>>,
    AuthUser(actor): AuthUser,
    Json(request): Json<SendRequest>,
) -> Result<Response, MessagingError> {
    let message = service.send(&actor, &request.recipient, &request.body)?;
    Ok((StatusCode::CREATED, Json(message)).into_response())
}

pub(crate) async fn conversations_handler(
    State(service): State<Arc<MessagingService>>,
    AuthUser(actor): AuthUser,
) -> Result<Response, MessagingError> {
    Ok(Json(service.conversations(&actor)?).into_response())
}

pub(crate) async fn messages_handler(
    State(service): State<Arc<MessagingService>>,
    AuthUser(actor): AuthUser,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Response, MessagingError> {
    Ok(Json(service.messages(&actor, &conversation_id)?).into_response())
}
