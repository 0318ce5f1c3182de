//! Storage layer for VaultKeeper
//!
//! Defines the store seams the auth service and handlers depend on, with a
//! Postgres implementation for production and an in-process implementation
//! for tests and offline runs. The session operations carry the rotation
//! contract: `rotate_session` is a single atomic conditional write.

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CardRecord, CredentialRecord, Session, TextRecord, User};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Uniqueness violated: duplicate login, duplicate refresh token, or a
    /// rotation whose new token collides with another row.
    #[error("Row already exists")]
    AlreadyExists,

    /// No matching row, or (for session lookups) the row is expired. A
    /// rotation that matched zero rows also reports this: the caller lost
    /// the race or replayed an already-rotated token.
    #[error("Row not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::AlreadyExists,
            _ => StorageError::Database(e.to_string()),
        }
    }
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. `AlreadyExists` if the login is taken.
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, StorageError>;

    /// `NotFound` if no such login.
    async fn find_user_by_login(&self, login: &str) -> Result<User, StorageError>;
}

/// Session persistence keyed by refresh token
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session row. `AlreadyExists` on a refresh-token collision
    /// (or duplicate call) -- surfaced, never swallowed.
    async fn create_session(&self, session: &Session) -> Result<(), StorageError>;

    /// Look up a live session. `NotFound` covers both absent and expired
    /// rows; an expired row may remain for later cleanup but is never served.
    async fn find_live_session(&self, refresh_token: &str) -> Result<Session, StorageError>;

    /// Atomically replace the row keyed by `old_refresh_token` with
    /// `new_session`, conditioned on that row still existing and being live.
    /// Zero matched rows => `NotFound`; under N concurrent rotations on one
    /// token exactly one caller succeeds. A new-token collision with a
    /// different row => `AlreadyExists`.
    async fn rotate_session(
        &self,
        new_session: &Session,
        old_refresh_token: &str,
    ) -> Result<(), StorageError>;
}

/// Per-user secret record persistence. Plain CRUD, no invariants.
#[async_trait]
pub trait VaultStore: Send + Sync {
    async fn list_text(&self, user_id: i64) -> Result<Vec<TextRecord>, StorageError>;
    async fn create_text(&self, user_id: i64, record: &TextRecord) -> Result<(), StorageError>;
    async fn update_text(&self, user_id: i64, record: &TextRecord) -> Result<(), StorageError>;

    async fn list_cards(&self, user_id: i64) -> Result<Vec<CardRecord>, StorageError>;
    async fn create_card(&self, user_id: i64, record: &CardRecord) -> Result<(), StorageError>;
    async fn update_card(&self, user_id: i64, record: &CardRecord) -> Result<(), StorageError>;

    async fn list_credentials(&self, user_id: i64) -> Result<Vec<CredentialRecord>, StorageError>;
    async fn create_credential(
        &self,
        user_id: i64,
        record: &CredentialRecord,
    ) -> Result<(), StorageError>;
    async fn update_credential(
        &self,
        user_id: i64,
        record: &CredentialRecord,
    ) -> Result<(), StorageError>;
}

/// Everything the application needs from a backing store.
pub trait Storage: UserStore + SessionStore + VaultStore {}

impl<T: UserStore + SessionStore + VaultStore> Storage for T {}
