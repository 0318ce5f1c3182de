//! Authentication gate
//!
//! Extractor that validates the access token before a protected handler
//! runs. Verification is purely cryptographic: the session store is never
//! consulted on the request path.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::auth::{verify_access_token, AuthService, JwtError};
use crate::error::ApiError;

/// Cookie carrying the access token for clients that prefer cookies over
/// the Authorization header.
pub const ACCESS_TOKEN_COOKIE: &str = "AccessToken";

/// Authenticated user identity extracted from a verified access token
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Bearer header first, AccessToken cookie as a fallback
        let token = match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
        {
            Ok(TypedHeader(Authorization(bearer))) => bearer.token().to_string(),
            Err(_) => {
                let jar = CookieJar::from_headers(&parts.headers);
                jar.get(ACCESS_TOKEN_COOKIE)
                    .map(|c| c.value().to_string())
                    .ok_or_else(|| {
                        ApiError::Unauthorized("Please, sign in first".to_string())
                    })?
            }
        };

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims =
            verify_access_token(&token, auth_service.jwt_secret()).map_err(|e| match e {
                JwtError::Expired => ApiError::Unauthorized("Token has expired".to_string()),
                _ => ApiError::Unauthorized("Please, provide valid credentials".to_string()),
            })?;

        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Please, provide valid credentials".to_string()))?;

        Ok(AuthenticatedUser { user_id })
    }
}
