//! Data models for the VaultKeeper backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// One active refresh cycle, keyed by the opaque refresh token.
///
/// A session is live iff `now < expires_at`. Rotation replaces the token
/// value in place; expired rows may linger but are never served.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Session {
    pub refresh_token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Access/refresh credential pair returned by every successful sign-up,
/// sign-in, or refresh. Never mutated; superseded by the next pair.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Sign-up / sign-in request body
#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct AuthRequest {
    #[validate(length(min = 1, max = 64))]
    pub login: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

/// Refresh request body (used when the RefreshToken cookie is absent)
#[derive(Debug, Deserialize, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

// ============================================================================
// Vault records
// ============================================================================

/// Free-text secret record
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, Default)]
pub struct TextRecord {
    #[serde(default)]
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub metadata: String,
}

/// Credit-card secret record
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, Default)]
pub struct CardRecord {
    #[serde(default)]
    pub id: i64,
    pub card_number: String,
    /// MM/YY
    pub exp_date: String,
    pub cvv: String,
    #[serde(default)]
    pub holder: String,
    #[serde(default)]
    pub metadata: String,
}

/// Login/password secret record
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, Default)]
pub struct CredentialRecord {
    #[serde(default)]
    pub id: i64,
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub metadata: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn session_liveness_is_strict() {
        let now = Utc::now();
        let session = Session {
            refresh_token: "tok".to_string(),
            user_id: 1,
            expires_at: now,
        };

        // now == expires_at counts as expired
        assert!(!session.is_live(now));
        assert!(session.is_live(now - Duration::seconds(1)));
        assert!(!session.is_live(now + Duration::seconds(1)));
    }

    #[test]
    fn auth_request_bounds() {
        let ok = AuthRequest {
            login: "alice".to_string(),
            password: "password1".to_string(),
        };
        assert!(ok.validate().is_ok());

        let short_password = AuthRequest {
            login: "alice".to_string(),
            password: "short".to_string(),
        };
        assert!(short_password.validate().is_err());

        let long_login = AuthRequest {
            login: "a".repeat(65),
            password: "password1".to_string(),
        };
        assert!(long_login.validate().is_err());
    }
}
