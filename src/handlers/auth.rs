//! Authentication HTTP handlers
//!
//! Sign-up, sign-in, and refresh. All three return a fresh token pair and
//! re-set the RefreshToken cookie; refresh accepts the token either from
//! that cookie or from the request body, for clients without cookie support.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{AuthRequest, RefreshRequest, TokenPair};
use crate::state::AppState;

/// Cookie carrying the refresh token, scoped to the refresh endpoint.
pub const REFRESH_TOKEN_COOKIE: &str = "RefreshToken";

/// Path the refresh cookie is scoped to.
pub const REFRESH_PATH: &str = "/api/user/auth/refresh";

fn with_refresh_cookie(jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    let cookie = Cookie::build((REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()))
        .path(REFRESH_PATH)
        .http_only(true)
        .build();
    jar.add(cookie)
}

/// POST /api/user/auth/sign-up - Register and sign in
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<AuthRequest>,
) -> ApiResult<(CookieJar, Json<TokenPair>)> {
    req.validate()?;

    let tokens = state.auth_service.sign_up(&req.login, &req.password).await?;

    Ok((with_refresh_cookie(jar, &tokens), Json(tokens)))
}

/// POST /api/user/auth/sign-in - Exchange credentials for tokens
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<AuthRequest>,
) -> ApiResult<(CookieJar, Json<TokenPair>)> {
    req.validate()?;

    let tokens = state.auth_service.sign_in(&req.login, &req.password).await?;

    Ok((with_refresh_cookie(jar, &tokens), Json(tokens)))
}

/// POST /api/user/auth/refresh - Rotate the refresh token
///
/// The refresh token comes from the RefreshToken cookie when present,
/// otherwise from the JSON body.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<(CookieJar, Json<TokenPair>)> {
    let refresh_token = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.map(|Json(req)| req.refresh_token))
        .ok_or_else(|| ApiError::BadRequest("Refresh token required".to_string()))?;

    let tokens = state.auth_service.refresh(&refresh_token).await?;

    Ok((with_refresh_cookie(jar, &tokens), Json(tokens)))
}
