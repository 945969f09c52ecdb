use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::RegistrationRequest;
use super::service::{AccountError, AccountService};
use crate::http::{error_response, AuthUser};
use crate::ids::UserId;
use crate::notify::Channel;

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    pub(crate) email: String,
    #[serde(default = "default_channel")]
    pub(crate) channel: Channel,
    pub(crate) code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResendRequest {
    pub(crate) email: String,
    #[serde(default = "default_channel")]
    pub(crate) channel: Channel,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForgotPasswordRequest {
    pub(crate) email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResetPasswordRequest {
    pub(crate) email: String,
    pub(crate) code: String,
    pub(crate) new_password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangePasswordRequest {
    pub(crate) current_password: String,
    pub(crate) new_password: String,
}

fn default_channel() -> Channel {
    Channel::Email
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = error_response(status, self.to_string());
        if let AccountError::Throttled { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Router builder exposing registration, verification and login endpoints.
pub fn account_router(service: Arc<AccountService>) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(register_handler))
        .route("/api/v1/auth/verify", post(verify_handler))
        .route("/api/v1/auth/resend", post(resend_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/auth/me", get(me_handler))
        .route("/api/v1/auth/password/forgot", post(forgot_password_handler))
        .route("/api/v1/auth/password/reset", post(reset_password_handler))
        .route("/api/v1/auth/password/change", post(change_password_handler))
        .route("/api/v1/admin/users/:user_id/suspend", post(suspend_handler))
        .route("/api/v1/admin/users/:user_id/reinstate", post(reinstate_handler))
        .with_state(service)
}

/// Runs a password-hashing service call on the blocking pool.
async fn off_runtime<T, F>(service: Arc<AccountService>, work: F) -> Result<T, AccountError>
where
    F: FnOnce(&AccountService) -> Result<T, AccountError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&service))
        .await
        .map_err(|err| AccountError::Worker(err.to_string()))?
}

pub(crate) async fn register_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<RegistrationRequest>,
) -> Result<Response, AccountError> {
    let view = off_runtime(service, move |service| service.register(request)).await?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

pub(crate) async fn verify_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<VerifyRequest>,
) -> Result<Response, AccountError> {
    let view = service.verify_otp(&request.email, request.channel, &request.code)?;
    Ok(Json(view).into_response())
}

pub(crate) async fn resend_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<ResendRequest>,
) -> Result<Response, AccountError> {
    service.resend_otp(&request.email, request.channel)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "sent" }))).into_response())
}

pub(crate) async fn login_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AccountError> {
    let login =
        off_runtime(service, move |service| service.login(&request.email, &request.password))
            .await?;
    Ok(Json(login).into_response())
}

pub(crate) async fn me_handler(
    State(service): State<Arc<AccountService>>,
    AuthUser(actor): AuthUser,
) -> Result<Response, AccountError> {
    Ok(Json(service.profile(&actor)?).into_response())
}

pub(crate) async fn forgot_password_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Response, AccountError> {
    service.request_password_reset(&request.email)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "sent" }))).into_response())
}

pub(crate) async fn reset_password_handler(
    State(service): State<Arc<AccountService>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Response, AccountError> {
    off_runtime(service, move |service| {
        service.reset_password(&request.email, &request.code, &request.new_password)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn change_password_handler(
    State(service): State<Arc<AccountService>>,
    AuthUser(actor): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Response, AccountError> {
    off_runtime(service, move |service| {
        service.change_password(&actor, &request.current_password, &request.new_password)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn suspend_handler(
    State(service): State<Arc<AccountService>>,
    AuthUser(actor): AuthUser,
    Path(user_id): Path<UserId>,
) -> Result<Response, AccountError> {
    Ok(Json(service.suspend(&actor, &user_id)?).into_response())
}

pub(crate) async fn reinstate_handler(
    State(service): State<Arc<AccountService>>,
    AuthUser(actor): AuthUser,
    Path(user_id): Path<UserId>,
) -> Result<Response, AccountError> {
    Ok(Json(service.reinstate(&actor, &user_id)?).into_response())
}
