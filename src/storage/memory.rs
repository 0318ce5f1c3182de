//! In-process storage
//!
//! Backs the unit and HTTP-level tests, and lets the server run without a
//! database. One mutex guards the whole store, so `rotate_session` gets the
//! same atomicity the Postgres conditional UPDATE provides.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{CardRecord, CredentialRecord, Session, TextRecord, User};

use super::{SessionStore, StorageError, UserStore, VaultStore};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    sessions: HashMap<String, Session>,
    text: HashMap<i64, Vec<TextRecord>>,
    cards: HashMap<i64, Vec<CardRecord>>,
    credentials: HashMap<i64, Vec<CredentialRecord>>,
    next_user_id: i64,
    next_record_id: i64,
}

/// Mutex-guarded in-memory storage
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of session rows, live or expired. Test hook.
    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, StorageError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.users.iter().any(|u| u.login == login) {
            return Err(StorageError::AlreadyExists);
        }

        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());

        Ok(user)
    }

    async fn find_user_by_login(&self, login: &str) -> Result<User, StorageError> {
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .iter()
            .find(|u| u.login == login)
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl SessionStore for MemoryStorage {
    async fn create_session(&self, session: &Session) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();

        if inner.sessions.contains_key(&session.refresh_token) {
            return Err(StorageError::AlreadyExists);
        }
        inner
            .sessions
            .insert(session.refresh_token.clone(), session.clone());

        Ok(())
    }

    async fn find_live_session(&self, refresh_token: &str) -> Result<Session, StorageError> {
        let inner = self.inner.lock().unwrap();
        // Expired rows stay in the map but are treated as absent.
        inner
            .sessions
            .get(refresh_token)
            .filter(|s| s.is_live(Utc::now()))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn rotate_session(
        &self,
        new_session: &Session,
        old_refresh_token: &str,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();

        let live = inner
            .sessions
            .get(old_refresh_token)
            .map(|s| s.is_live(Utc::now()))
            .unwrap_or(false);
        if !live {
            return Err(StorageError::NotFound);
        }

        if new_session.refresh_token != old_refresh_token
            && inner.sessions.contains_key(&new_session.refresh_token)
        {
            return Err(StorageError::AlreadyExists);
        }

        inner.sessions.remove(old_refresh_token);
        inner
            .sessions
            .insert(new_session.refresh_token.clone(), new_session.clone());

        Ok(())
    }
}

#[async_trait]
impl VaultStore for MemoryStorage {
    async fn list_text(&self, user_id: i64) -> Result<Vec<TextRecord>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.text.get(&user_id).cloned().unwrap_or_default())
    }

    async fn create_text(&self, user_id: i64, record: &TextRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_record_id += 1;
        let record = TextRecord {
            id: inner.next_record_id,
            ..record.clone()
        };
        inner.text.entry(user_id).or_default().push(record);
        Ok(())
    }

    async fn update_text(&self, user_id: i64, record: &TextRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let existing = inner
            .text
            .entry(user_id)
            .or_default()
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(StorageError::NotFound)?;
        *existing = record.clone();
        Ok(())
    }

    async fn list_cards(&self, user_id: i64) -> Result<Vec<CardRecord>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.cards.get(&user_id).cloned().unwrap_or_default())
    }

    async fn create_card(&self, user_id: i64, record: &CardRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_record_id += 1;
        let record = CardRecord {
            id: inner.next_record_id,
            ..record.clone()
        };
        inner.cards.entry(user_id).or_default().push(record);
        Ok(())
    }

    async fn update_card(&self, user_id: i64, record: &CardRecord) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let existing = inner
            .cards
            .entry(user_id)
            .or_default()
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(StorageError::NotFound)?;
        *existing = record.clone();
        Ok(())
    }

    async fn list_credentials(&self, user_id: i64) -> Result<Vec<CredentialRecord>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.credentials.get(&user_id).cloned().unwrap_or_default())
    }

    async fn create_credential(
        &self,
        user_id: i64,
        record: &CredentialRecord,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_record_id += 1;
        let record = CredentialRecord {
            id: inner.next_record_id,
            ..record.clone()
        };
        inner.credentials.entry(user_id).or_default().push(record);
        Ok(())
    }

    async fn update_credential(
        &self,
        user_id: i64,
        record: &CredentialRecord,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        let existing = inner
            .credentials
            .entry(user_id)
            .or_default()
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(StorageError::NotFound)?;
        *existing = record.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(token: &str, user_id: i64, ttl_secs: i64) -> Session {
        Session {
            refresh_token: token.to_string(),
            user_id,
            expires_at: Utc::now() + Duration::seconds(ttl_secs),
        }
    }

    #[tokio::test]
    async fn create_session_surfaces_collisions() {
        let store = MemoryStorage::new();
        store.create_session(&session("tok-a", 1, 60)).await.unwrap();

        let err = store
            .create_session(&session("tok-a", 2, 60))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists));
    }

    #[tokio::test]
    async fn expired_session_is_absent_but_row_remains() {
        let store = MemoryStorage::new();
        store.create_session(&session("tok-a", 1, -60)).await.unwrap();

        let err = store.find_live_session("tok-a").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn rotate_consumes_old_token() {
        let store = MemoryStorage::new();
        store.create_session(&session("tok-a", 1, 60)).await.unwrap();

        store
            .rotate_session(&session("tok-b", 1, 60), "tok-a")
            .await
            .unwrap();

        assert!(store.find_live_session("tok-a").await.is_err());
        assert!(store.find_live_session("tok-b").await.is_ok());
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn rotate_rejects_expired_old_token() {
        let store = MemoryStorage::new();
        store.create_session(&session("tok-a", 1, -60)).await.unwrap();

        let err = store
            .rotate_session(&session("tok-b", 1, 60), "tok-a")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn rotate_rejects_new_token_collision() {
        let store = MemoryStorage::new();
        store.create_session(&session("tok-a", 1, 60)).await.unwrap();
        store.create_session(&session("tok-b", 2, 60)).await.unwrap();

        let err = store
            .rotate_session(&session("tok-b", 1, 60), "tok-a")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists));
    }

    #[tokio::test]
    async fn concurrent_rotations_have_one_winner() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStorage::new());
        store.create_session(&session("tok-a", 1, 60)).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .rotate_session(&session(&format!("tok-new-{i}"), 1, 60), "tok-a")
                    .await
            }));
        }

        let mut successes = 0;
        let mut not_found = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => successes += 1,
                Err(StorageError::NotFound) => not_found += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(not_found, 7);
        assert_eq!(store.session_count(), 1);
    }
}
