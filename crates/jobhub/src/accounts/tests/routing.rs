use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::accounts::domain::Role;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn register_route_returns_created_without_password_hash() {
    let harness = harness();

    let response = router(&harness)
        .oneshot(post_json(
            "/api/v1/auth/register",
            json!({
                "email": "casey@example.com",
                "full_name": "Casey Applicant",
                "password": PASSWORD,
                "role": "candidate"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "pending_verification");
    assert!(payload.get("password_hash").is_none());
}

#[tokio::test]
async fn register_route_maps_validation_errors() {
    let harness = harness();

    let response = router(&harness)
        .oneshot(post_json(
            "/api/v1/auth/register",
            json!({
                "email": "not-an-email",
                "full_name": "Casey",
                "password": PASSWORD,
                "role": "candidate"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().is_some());
}

#[tokio::test]
async fn login_and_me_round_trip_through_bearer_auth() {
    let harness = harness();
    active_user(&harness, "casey@example.com", Role::Employer);

    let response = router(&harness)
        .oneshot(post_json(
            "/api/v1/auth/login",
            json!({ "email": "casey@example.com", "password": PASSWORD }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let token = read_json_body(response).await["token"]
        .as_str()
        .expect("token string")
        .to_string();

    let response = router(&harness)
        .oneshot(
            Request::get("/api/v1/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["role"], "employer");

    let response = router(&harness)
        .oneshot(Request::get("/api/v1/auth/me").body(Body::empty()).unwrap())
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn throttled_resends_carry_retry_after() {
    let harness = harness();
    harness
        .service
        .register(registration("casey@example.com", Role::Candidate))
        .expect("registers");

    let mut last = None;
    for _ in 0..3 {
        let response = router(&harness)
            .oneshot(post_json(
                "/api/v1/auth/resend",
                json!({ "email": "casey@example.com" }),
            ))
            .await
            .expect("route executes");
        last = Some(response);
    }

    let response = last.expect("responses");
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let harness = harness();
    let target = active_user(&harness, "casey@example.com", Role::Candidate);
    let token = harness
        .service
        .login("casey@example.com", PASSWORD)
        .expect("logs in")
        .token;

    let response = router(&harness)
        .oneshot(
            Request::post(format!("/api/v1/admin/users/{}/suspend", target.id))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_codes_are_unprocessable() {
    let harness = harness();
    harness
        .service
        .register(registration("casey@example.com", Role::Candidate))
        .expect("registers");

    let response = router(&harness)
        .oneshot(post_json(
            "/api/v1/auth/verify",
            json!({ "email": "casey@example.com", "code": "000000x" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("message")
        .contains("incorrect"));
}

#[tokio::test]
async fn resend_route_does_not_reveal_unknown_addresses() {
    let harness = harness();

    let response = router(&harness)
        .oneshot(post_json(
            "/api/v1/auth/resend",
            json!({ "email": "ghost@example.com" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn change_password_route_swaps_the_credential() {
    let harness = harness();
    active_user(&harness, "casey@example.com", Role::Candidate);
    let token = harness
        .service
        .login("casey@example.com", PASSWORD)
        .expect("logs in")
        .token;

    let response = router(&harness)
        .oneshot(
            Request::post("/api/v1/auth/password/change")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "current_password": PASSWORD,
                        "new_password": "another-pass-2"
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router(&harness)
        .oneshot(post_json(
            "/api/v1/auth/login",
            json!({ "email": "casey@example.com", "password": "another-pass-2" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
}
