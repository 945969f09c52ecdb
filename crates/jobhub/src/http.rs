//! Pieces shared by every module router: bearer authentication and JSON
//! error bodies.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::accounts::{AccountError, AuthenticatedUser};

/// Resolves bearer tokens; installed on the router as an `Extension`.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, bearer: &str) -> Result<AuthenticatedUser, AccountError>;
}

pub type SharedAuthenticator = Arc<dyn Authenticator>;

/// Extractor for handlers that require a signed-in, active user.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub AuthenticatedUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = parts
            .extensions
            .get::<SharedAuthenticator>()
            .cloned()
            .ok_or_else(|| {
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "authentication is not configured",
                )
            })?;

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "missing bearer token"))?;

        authenticator
            .authenticate(token)
            .map(AuthUser)
            .map_err(|err| error_response(err.status_code(), err.to_string()))
    }
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let message: String = message.into();
    (status, Json(json!({ "error": message }))).into_response()
}
