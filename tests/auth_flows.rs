//! End-to-end authentication flow tests driven through the router.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use portfolio_backend::auth::jwt::JwtHandler;
use portfolio_backend::auth::models::{NewUser, Role, UserPatch};
use portfolio_backend::auth::store::{SqliteUserStore, UserStore};
use portfolio_backend::auth::{password, AuthState};
use portfolio_backend::build_router;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "integration-test-secret-32-chars!!";
const TEST_COST: u32 = 4;

fn test_app() -> (Router, AuthState, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let store = SqliteUserStore::new(temp_file.path().to_str().unwrap()).unwrap();
    let state = AuthState::new(
        Arc::new(store),
        Arc::new(JwtHandler::new(SECRET, 3600)),
        TEST_COST,
    );
    (build_router(state.clone()), state, temp_file)
}

fn json_request(method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn register_body(email: &str) -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": email,
        "password": "a long enough password",
    })
}

async fn register(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            Some(register_body(email)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _temp) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_then_me_round_trip() {
    let (app, _, _temp) = test_app();
    let token = register(&app, "a@b.com").await;

    let response = app
        .oneshot(json_request("GET", "/api/auth/me", None, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Ada Lovelace");
    assert_eq!(body["data"]["email"], "a@b.com");
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"]["id"].is_string());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, state, _temp) = test_app();
    register(&app, "a@b.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            Some(register_body("a@b.com")),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "User already exists");

    // Exactly one record for that email survives.
    let record = state.store.find_by_email("a@b.com").await.unwrap();
    assert!(record.is_some());
}

#[tokio::test]
async fn test_short_password_rejected_and_nothing_created() {
    let (app, state, _temp) = test_app();

    let mut body = register_body("a@b.com");
    body["password"] = json!("tooshort");

    let response = app
        .oneshot(json_request("POST", "/api/auth/register", Some(body), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.store.find_by_email("a@b.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _, _temp) = test_app();
    register(&app, "a@b.com").await;

    let wrong_password = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            Some(json!({"email": "a@b.com", "password": "not the password"})),
            None,
        ))
        .await
        .unwrap();

    let unknown_email = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            Some(json!({"email": "nobody@b.com", "password": "whatever it is"})),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    // Byte-identical bodies: nothing distinguishes the two failures.
    let first = body_bytes(wrong_password).await;
    let second = body_bytes(unknown_email).await;
    assert_eq!(first, second);

    let body: Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_token_works_against_me() {
    let (app, _, _temp) = test_app();
    register(&app, "a@b.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            Some(json!({"email": "A@B.com", "password": "a long enough password"})),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let me = app
        .oneshot(json_request("GET", "/api/auth/me", None, Some(&token)))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(body_json(me).await["data"]["email"], "a@b.com");
}

#[tokio::test]
async fn test_me_rejects_missing_bad_and_expired_tokens() {
    let (app, _, _temp) = test_app();

    let missing = app
        .clone()
        .oneshot(json_request("GET", "/api/auth/me", None, None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .clone()
        .oneshot(json_request("GET", "/api/auth/me", None, Some("not.a.jwt")))
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    // Correctly signed but already expired.
    let expired_issuer = JwtHandler::new(SECRET, -120);
    let expired = expired_issuer.issue(Uuid::new_v4(), Role::User).unwrap();
    let response = app
        .oneshot(json_request("GET", "/api/auth/me", None, Some(&expired)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_for_vanished_account_rejected() {
    let (app, state, _temp) = test_app();

    // Well-formed, unexpired token whose subject has no record.
    let token = state.jwt.issue(Uuid::new_v4(), Role::Admin).unwrap();

    let response = app
        .oneshot(json_request("GET", "/api/auth/me", None, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_gate_honors_demotion_immediately() {
    let (app, state, _temp) = test_app();

    // Privileged in-process creation: the only way to get an admin.
    let hash = password::hash_password("an admin passphrase".to_string(), TEST_COST)
        .await
        .unwrap();
    let admin = state
        .store
        .create(NewUser {
            name: "Admin".to_string(),
            email: "admin@b.com".to_string(),
            password_hash: hash,
            role: Role::Admin,
        })
        .await
        .unwrap();
    let token = state.jwt.issue(admin.id, admin.role).unwrap();

    let allowed = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/portfolio",
            Some(json!({"name": "New Owner"})),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::CREATED);

    // Demote in the store, then replay the same still-unexpired token.
    state
        .store
        .update(
            admin.id,
            UserPatch {
                role: Some(Role::User),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let replayed = app
        .oneshot(json_request(
            "POST",
            "/api/portfolio",
            Some(json!({"name": "New Owner"})),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(replayed.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_regular_user_cannot_write_portfolio() {
    let (app, _, _temp) = test_app();
    let token = register(&app, "a@b.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/portfolio",
            Some(json!({"name": "Mallory"})),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The public read stays open.
    let read = app
        .oneshot(json_request("GET", "/api/portfolio", None, None))
        .await
        .unwrap();
    assert_eq!(read.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_registration_payload_cannot_set_role() {
    let (app, state, _temp) = test_app();

    // A role field in the payload is ignored, not honored.
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "name": "Mallory",
                "email": "mallory@b.com",
                "password": "a long enough password",
                "role": "admin",
            })),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let user = state
        .store
        .find_by_email("mallory@b.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.role, Role::User);
}
