//! End-to-end auth and vault flow tests against the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use vaultkeeper::auth::{verify_access_token, AuthService};
use vaultkeeper::models::TokenPair;
use vaultkeeper::routes;
use vaultkeeper::state::AppState;
use vaultkeeper::storage::{MemoryStorage, Storage};

const JWT_SECRET: &str = "integration-test-secret";

fn test_app() -> Router {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let auth_service = Arc::new(AuthService::new(
        storage.clone(),
        JWT_SECRET.to_string(),
        900,
        30,
    ));
    routes::app(AppState::new(auth_service, storage))
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn sign_up(app: &Router, login: &str, password: &str) -> TokenPair {
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/user/auth/sign-up",
            json!({"login": login, "password": password}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_value(body_json(response).await).unwrap()
}

async fn refresh_with(app: &Router, refresh_token: &str) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "/api/user/auth/refresh",
            json!({"refresh_token": refresh_token}),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn sign_up_returns_a_verifiable_token_pair() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/user/auth/sign-up",
            json!({"login": "alice", "password": "password1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("refresh cookie set")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("RefreshToken="));
    assert!(cookie.contains("Path=/api/user/auth/refresh"));
    assert!(cookie.contains("HttpOnly"));

    let pair: TokenPair = serde_json::from_value(body_json(response).await).unwrap();
    let claims = verify_access_token(&pair.access_token, JWT_SECRET).unwrap();
    assert_eq!(claims.user_id().unwrap(), 1);
    assert_eq!(pair.refresh_token.len(), 64);
}

#[tokio::test]
async fn duplicate_sign_up_conflicts() {
    let app = test_app();
    sign_up(&app, "alice", "password1").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/user/auth/sign-up",
            json!({"login": "alice", "password": "other-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn sign_in_rejects_bad_credentials() {
    let app = test_app();
    sign_up(&app, "alice", "password1").await;

    let wrong_password = app
        .clone()
        .oneshot(json_request(
            "/api/user/auth/sign-in",
            json!({"login": "alice", "password": "wrong-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);

    let unknown_login = app
        .clone()
        .oneshot(json_request(
            "/api/user/auth/sign-in",
            json!({"login": "nobody", "password": "password1"}),
        ))
        .await
        .unwrap();
    assert_eq!(unknown_login.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn short_password_is_rejected_before_touching_storage() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/user/auth/sign-up",
            json!({"login": "alice", "password": "short"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_rotates_and_the_old_token_is_single_use() {
    let app = test_app();
    let first = sign_up(&app, "alice", "password1").await;

    let response = refresh_with(&app, &first.refresh_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let second: TokenPair = serde_json::from_value(body_json(response).await).unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);

    // Replay of the consumed token reads as an expired session.
    let replay = refresh_with(&app, &first.refresh_token).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    // The rotated token stays usable.
    let third = refresh_with(&app, &second.refresh_token).await;
    assert_eq!(third.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_without_cookie_or_body_is_a_bad_request() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user/auth/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_accepts_the_cookie() {
    let app = test_app();
    let pair = sign_up(&app, "alice", "password1").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/user/auth/refresh")
                .header(
                    header::COOKIE,
                    format!("RefreshToken={}", pair.refresh_token),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn vault_requires_a_valid_access_token() {
    let app = test_app();

    let anonymous = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/materials/text")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/materials/text")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn vault_round_trip_with_bearer_token() {
    let app = test_app();
    let pair = sign_up(&app, "alice", "password1").await;
    let bearer = format!("Bearer {}", pair.access_token);

    let create = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/materials/text")
                .header(header::AUTHORIZATION, &bearer)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"text": "launch codes", "metadata": "work"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::OK);

    let list = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/materials/text")
                .header(header::AUTHORIZATION, &bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(list.status(), StatusCode::OK);

    let records = body_json(list).await;
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["text"], "launch codes");
}

#[tokio::test]
async fn vault_records_are_scoped_to_their_owner() {
    let app = test_app();
    let alice = sign_up(&app, "alice", "password1").await;
    let bob = sign_up(&app, "bob", "password2").await;

    let create = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/materials/text")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", alice.access_token),
                )
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"text": "alice's note"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::OK);

    let bobs_view = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/materials/text")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", bob.access_token),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(bobs_view.status(), StatusCode::OK);
    assert!(body_json(bobs_view).await.as_array().unwrap().is_empty());
}
