//! Route definitions for the VaultKeeper API

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::handlers::{auth, vault};
use crate::middleware::request_tracing;
use crate::state::AppState;

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/auth/sign-up", post(auth::sign_up))
        .route("/api/user/auth/sign-in", post(auth::sign_in))
        .route("/api/user/auth/refresh", post(auth::refresh))
}

fn vault_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/materials/text",
            get(vault::list_text)
                .put(vault::create_text)
                .post(vault::update_text),
        )
        .route(
            "/api/materials/card",
            get(vault::list_cards)
                .put(vault::create_card)
                .post(vault::update_card),
        )
        .route(
            "/api/materials/cred",
            get(vault::list_credentials)
                .put(vault::create_credential)
                .post(vault::update_credential),
        )
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(vault_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(request_tracing))
        .layer(CorsLayer::permissive())
}
