//! Postgres-backed storage
//!
//! Session rotation relies on the primary key over `sessions.refresh_token`:
//! a single conditional UPDATE checked via `rows_affected` gives the
//! exactly-once guarantee without any in-process locking.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{CardRecord, CredentialRecord, Session, TextRecord, User};

use super::{SessionStore, StorageError, UserStore, VaultStore};

/// Storage over a pooled Postgres connection
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStorage {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, StorageError> {
        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (login, password_hash)
            VALUES ($1, $2)
            RETURNING id, login, password_hash, created_at
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_login(&self, login: &str) -> Result<User, StorageError> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, login, password_hash, created_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl SessionStore for PgStorage {
    async fn create_session(&self, session: &Session) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (refresh_token, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&session.refresh_token)
        .bind(session.user_id)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_live_session(&self, refresh_token: &str) -> Result<Session, StorageError> {
        // Expired rows are filtered here, not deleted; lazy cleanup.
        let session: Option<Session> = sqlx::query_as(
            r#"
            SELECT refresh_token, user_id, expires_at
            FROM sessions
            WHERE refresh_token = $1 AND expires_at > now()
            "#,
        )
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await?;

        session.ok_or(StorageError::NotFound)
    }

    async fn rotate_session(
        &self,
        new_session: &Session,
        old_refresh_token: &str,
    ) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE sessions
            SET refresh_token = $1, user_id = $2, expires_at = $3
            WHERE refresh_token = $4 AND expires_at > now()
            "#,
        )
        .bind(&new_session.refresh_token)
        .bind(new_session.user_id)
        .bind(new_session.expires_at)
        .bind(old_refresh_token)
        .execute(&self.pool)
        .await?
        .rows_affected();

        // Zero matched rows: the old token was already rotated, expired, or
        // never existed. Exactly one concurrent caller can observe success.
        if rows_affected == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl VaultStore for PgStorage {
    async fn list_text(&self, user_id: i64) -> Result<Vec<TextRecord>, StorageError> {
        let records: Vec<TextRecord> = sqlx::query_as(
            r#"
            SELECT id, text, metadata
            FROM text_records
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn create_text(&self, user_id: i64, record: &TextRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO text_records (user_id, text, metadata)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&record.text)
        .bind(&record.metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_text(&self, user_id: i64, record: &TextRecord) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE text_records
            SET text = $1, metadata = $2
            WHERE user_id = $3 AND id = $4
            "#,
        )
        .bind(&record.text)
        .bind(&record.metadata)
        .bind(user_id)
        .bind(record.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn list_cards(&self, user_id: i64) -> Result<Vec<CardRecord>, StorageError> {
        let records: Vec<CardRecord> = sqlx::query_as(
            r#"
            SELECT id, card_number, exp_date, cvv, holder, metadata
            FROM card_records
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn create_card(&self, user_id: i64, record: &CardRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO card_records (user_id, card_number, exp_date, cvv, holder, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(&record.card_number)
        .bind(&record.exp_date)
        .bind(&record.cvv)
        .bind(&record.holder)
        .bind(&record.metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_card(&self, user_id: i64, record: &CardRecord) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE card_records
            SET card_number = $1, exp_date = $2, cvv = $3, holder = $4, metadata = $5
            WHERE user_id = $6 AND id = $7
            "#,
        )
        .bind(&record.card_number)
        .bind(&record.exp_date)
        .bind(&record.cvv)
        .bind(&record.holder)
        .bind(&record.metadata)
        .bind(user_id)
        .bind(record.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn list_credentials(&self, user_id: i64) -> Result<Vec<CredentialRecord>, StorageError> {
        let records: Vec<CredentialRecord> = sqlx::query_as(
            r#"
            SELECT id, login, password, metadata
            FROM credential_records
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn create_credential(
        &self,
        user_id: i64,
        record: &CredentialRecord,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO credential_records (user_id, login, password, metadata)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(&record.login)
        .bind(&record.password)
        .bind(&record.metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_credential(
        &self,
        user_id: i64,
        record: &CredentialRecord,
    ) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE credential_records
            SET login = $1, password = $2, metadata = $3
            WHERE user_id = $4 AND id = $5
            "#,
        )
        .bind(&record.login)
        .bind(&record.password)
        .bind(&record.metadata)
        .bind(user_id)
        .bind(record.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
