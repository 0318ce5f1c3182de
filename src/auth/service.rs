//! Authentication service
//!
//! Orchestrates sign-up, sign-in, and refresh over the token issuer, the
//! credential verifier, and the session store. Stateless per call; the only
//! shared mutable state is what the store persists.

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;

use crate::models::{Session, TokenPair};
use crate::storage::{Storage, StorageError, UserStore};

use super::jwt::{mint_access_token, new_refresh_token, JwtError};
use super::password::{hash_password, verify_password, PasswordError};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User with such login already exists")]
    UserAlreadyExists,

    #[error("User doesn't exist")]
    UserNotFound,

    #[error("Bad password")]
    BadPassword,

    /// Covers true expiry, an unknown token, and replay of an
    /// already-rotated token. Deliberately indistinguishable to the caller.
    #[error("Session was expired or not found")]
    SessionExpiredOrNotFound,

    /// Refresh-token collision on insert or rotation. Never swallowed.
    #[error("Session already exists")]
    SessionAlreadyExists,

    #[error("Token error: {0}")]
    Token(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        AuthError::Token(e.to_string())
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        AuthError::Token(e.to_string())
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Storage>,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_days: i64,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Storage>,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_days: i64,
    ) -> Self {
        Self {
            store,
            jwt_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_days,
        }
    }

    /// Register a new user and sign them in.
    ///
    /// Sign-up implies sign-in as a documented policy choice: the caller
    /// gets a usable token pair without a second round trip.
    pub async fn sign_up(&self, login: &str, password: &str) -> Result<TokenPair, AuthError> {
        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(login, &password_hash)
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists => AuthError::UserAlreadyExists,
                other => AuthError::Storage(other.to_string()),
            })?;

        tracing::info!(user_id = user.id, "User registered");

        self.issue_session(user.id, None).await
    }

    /// Exchange credentials for a fresh token pair.
    pub async fn sign_in(&self, login: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .store
            .find_user_by_login(login)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => AuthError::UserNotFound,
                other => AuthError::Storage(other.to_string()),
            })?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::BadPassword);
        }

        self.issue_session(user.id, None).await
    }

    /// Exchange a refresh token for a new pair, rotating the session.
    ///
    /// A rotation that matches zero rows (lost race, replay, expiry between
    /// lookup and rotation) fails the whole call rather than retrying:
    /// refresh tokens are single-use and the caller must re-authenticate.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let session = self
            .store
            .find_live_session(refresh_token)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => AuthError::SessionExpiredOrNotFound,
                other => AuthError::Storage(other.to_string()),
            })?;

        self.issue_session(session.user_id, Some(refresh_token)).await
    }

    /// Access-token verification secret, for the request gate.
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// Mint a new token pair and persist the session. With `old_token` the
    /// existing row is rotated atomically; without it a new row is inserted.
    async fn issue_session(
        &self,
        user_id: i64,
        old_token: Option<&str>,
    ) -> Result<TokenPair, AuthError> {
        let access_token =
            mint_access_token(user_id, &self.jwt_secret, self.access_token_ttl_seconds)?;
        let refresh_token = new_refresh_token();

        let session = Session {
            refresh_token: refresh_token.clone(),
            user_id,
            expires_at: Utc::now() + Duration::days(self.refresh_token_ttl_days),
        };

        let result = match old_token {
            None => self.store.create_session(&session).await,
            Some(old) => self.store.rotate_session(&session, old).await,
        };

        result.map_err(|e| match (e, old_token) {
            (StorageError::AlreadyExists, _) => AuthError::SessionAlreadyExists,
            (StorageError::NotFound, Some(_)) => {
                tracing::warn!(user_id, "Refresh token rotation lost a race or was replayed");
                AuthError::SessionExpiredOrNotFound
            }
            (other, _) => AuthError::Storage(other.to_string()),
        })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::verify_access_token;
    use crate::storage::MemoryStorage;

    const SECRET: &str = "test-secret-key";

    fn service(store: Arc<MemoryStorage>) -> AuthService {
        AuthService::new(store, SECRET.to_string(), 900, 30)
    }

    #[tokio::test]
    async fn sign_up_implies_sign_in() {
        let auth = service(Arc::new(MemoryStorage::new()));

        let pair = auth.sign_up("alice", "password1").await.unwrap();

        // Access token verifies to the new user's ID without any store access
        let claims = verify_access_token(&pair.access_token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), 1);
        assert!(!pair.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn duplicate_sign_up_preserves_first_user() {
        let store = Arc::new(MemoryStorage::new());
        let auth = service(store.clone());

        auth.sign_up("alice", "password1").await.unwrap();
        let first_hash = store.find_user_by_login("alice").await.unwrap().password_hash;

        let err = auth.sign_up("alice", "different1").await.unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));

        let hash_after = store.find_user_by_login("alice").await.unwrap().password_hash;
        assert_eq!(first_hash, hash_after);
    }

    #[tokio::test]
    async fn sign_in_rejects_unknown_login_and_bad_password() {
        let auth = service(Arc::new(MemoryStorage::new()));
        auth.sign_up("alice", "password1").await.unwrap();

        let err = auth.sign_in("bob", "password1").await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));

        let err = auth.sign_in("alice", "wrong-pass").await.unwrap_err();
        assert!(matches!(err, AuthError::BadPassword));

        assert!(auth.sign_in("alice", "password1").await.is_ok());
    }

    #[tokio::test]
    async fn refresh_rotates_and_old_token_is_single_use() {
        let auth = service(Arc::new(MemoryStorage::new()));

        let first = auth.sign_up("alice", "password1").await.unwrap();
        let second = auth.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        // Replay of the consumed token is indistinguishable from expiry
        let err = auth.refresh(&first.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionExpiredOrNotFound));

        // The rotated token still works
        assert!(auth.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_rejects_expired_session_though_row_remains() {
        let store = Arc::new(MemoryStorage::new());
        // Refresh TTL in the past: the session row exists but is never live
        let auth = AuthService::new(store.clone(), SECRET.to_string(), 900, -1);

        let pair = auth.sign_up("alice", "password1").await.unwrap();
        assert_eq!(store.session_count(), 1);

        let err = auth.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionExpiredOrNotFound));
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_refreshes_have_one_winner() {
        let store = Arc::new(MemoryStorage::new());
        let auth = service(store.clone());

        let pair = auth.sign_up("alice", "password1").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let auth = auth.clone();
            let token = pair.refresh_token.clone();
            handles.push(tokio::spawn(async move { auth.refresh(&token).await }));
        }

        let mut successes = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(AuthError::SessionExpiredOrNotFound) => rejected += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(rejected, 7);
        assert_eq!(store.session_count(), 1);
    }
}
