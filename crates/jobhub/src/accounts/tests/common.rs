use std::sync::Arc;

use axum::response::Response;
use axum::{Extension, Router};
use chrono::NaiveDate;
use serde_json::Value;

use crate::accounts::domain::{AccountStatus, AuthenticatedUser, RegistrationRequest, Role, User};
use crate::accounts::password::hash_password;
use crate::accounts::{account_router, AccountService, UserRepository, UserView};
use crate::clock::ManualClock;
use crate::config::AuthConfig;
use crate::http::SharedAuthenticator;
use crate::ids::UserId;
use crate::notify::{extract_code, RecordingNotifier};
use crate::store::memory::InMemoryUsers;

pub(super) const PASSWORD: &str = "hunter2-and-more";

pub(super) struct Harness {
    pub(super) service: Arc<AccountService>,
    pub(super) users: Arc<InMemoryUsers>,
    pub(super) outbox: RecordingNotifier,
    pub(super) clock: Arc<ManualClock>,
}

pub(super) fn harness() -> Harness {
    harness_with(AuthConfig::default())
}

pub(super) fn harness_with(config: AuthConfig) -> Harness {
    let users = Arc::new(InMemoryUsers::default());
    let outbox = RecordingNotifier::default();
    let clock = Arc::new(ManualClock::at_date(
        NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date"),
    ));
    let service = Arc::new(AccountService::new(
        users.clone(),
        Arc::new(outbox.clone()),
        clock.clone(),
        &config,
    ));

    Harness {
        service,
        users,
        outbox,
        clock,
    }
}

pub(super) fn registration(email: &str, role: Role) -> RegistrationRequest {
    RegistrationRequest {
        email: email.to_string(),
        phone: None,
        full_name: "Casey Applicant".to_string(),
        password: PASSWORD.to_string(),
        role,
    }
}

pub(super) fn latest_code(outbox: &RecordingNotifier, destination: &str, template: &str) -> String {
    let notification = outbox
        .last_to(destination, template)
        .expect("notification delivered");
    extract_code(&notification.body).expect("code in body")
}

/// Register and verify an account so it can log in.
pub(super) fn active_user(harness: &Harness, email: &str, role: Role) -> UserView {
    harness
        .service
        .register(registration(email, role))
        .expect("registers");
    let code = latest_code(&harness.outbox, email, "otp_verification");
    harness
        .service
        .verify_otp(email, crate::notify::Channel::Email, &code)
        .expect("verifies")
}

pub(super) fn seed_admin(harness: &Harness) -> AuthenticatedUser {
    let admin = User {
        id: UserId::generate(),
        email: "ops@jobhub.test".to_string(),
        phone: None,
        full_name: "Ops Admin".to_string(),
        role: Role::Admin,
        password_hash: hash_password(PASSWORD).expect("hashes"),
        email_verified: true,
        phone_verified: false,
        status: AccountStatus::Active,
        created_at: chrono::Utc::now(),
    };
    let admin = harness.users.insert(admin).expect("insert admin");
    AuthenticatedUser {
        user_id: admin.id,
        role: Role::Admin,
    }
}

pub(super) fn router(harness: &Harness) -> Router {
    let authenticator: SharedAuthenticator = harness.service.clone();
    account_router(harness.service.clone()).layer(Extension(authenticator))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
