//! HTTP client for the VaultKeeper API
//!
//! Wire counterpart of the server handlers; maps response statuses onto the
//! client error taxonomy. The client holds no token state -- callers pass
//! the credential they want used, and the refresh scheduler owns the pair.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::{AuthRequest, CardRecord, CredentialRecord, RefreshRequest, TextRecord, TokenPair};

use super::scheduler::RefreshApi;

const SIGN_UP_ENDPOINT: &str = "/api/user/auth/sign-up";
const SIGN_IN_ENDPOINT: &str = "/api/user/auth/sign-in";
const REFRESH_ENDPOINT: &str = "/api/user/auth/refresh";

const TEXT_ENDPOINT: &str = "/api/materials/text";
const CARD_ENDPOINT: &str = "/api/materials/card";
const CRED_ENDPOINT: &str = "/api/materials/cred";

/// Client-side error taxonomy
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Bad request")]
    BadRequest,

    #[error("User with such login already exists")]
    UserAlreadyExists,

    /// Unknown login, bad password, or an expired/rotated session.
    #[error("Unauthorized; sign in again")]
    Unauthorized,

    #[error("Internal server error")]
    Internal,

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

fn map_status(status: StatusCode) -> ClientError {
    match status {
        StatusCode::BAD_REQUEST => ClientError::BadRequest,
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::CONFLICT => ClientError::UserAlreadyExists,
        StatusCode::INTERNAL_SERVER_ERROR => ClientError::Internal,
        other => ClientError::UnexpectedStatus(other.as_u16()),
    }
}

/// VaultKeeper API client
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn sign_up(&self, login: &str, password: &str) -> Result<TokenPair, ClientError> {
        self.post_json(
            SIGN_UP_ENDPOINT,
            &AuthRequest {
                login: login.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    pub async fn sign_in(&self, login: &str, password: &str) -> Result<TokenPair, ClientError> {
        self.post_json(
            SIGN_IN_ENDPOINT,
            &AuthRequest {
                login: login.to_string(),
                password: password.to_string(),
            },
        )
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ClientError> {
        self.post_json(
            REFRESH_ENDPOINT,
            &RefreshRequest {
                refresh_token: refresh_token.to_string(),
            },
        )
        .await
    }

    pub async fn list_text(&self, access_token: &str) -> Result<Vec<TextRecord>, ClientError> {
        self.get_authed(TEXT_ENDPOINT, access_token).await
    }

    pub async fn list_cards(&self, access_token: &str) -> Result<Vec<CardRecord>, ClientError> {
        self.get_authed(CARD_ENDPOINT, access_token).await
    }

    pub async fn list_credentials(
        &self,
        access_token: &str,
    ) -> Result<Vec<CredentialRecord>, ClientError> {
        self.get_authed(CRED_ENDPOINT, access_token).await
    }

    pub async fn create_text(
        &self,
        access_token: &str,
        record: &TextRecord,
    ) -> Result<(), ClientError> {
        self.put_authed(TEXT_ENDPOINT, access_token, record).await
    }

    pub async fn create_card(
        &self,
        access_token: &str,
        record: &CardRecord,
    ) -> Result<(), ClientError> {
        self.put_authed(CARD_ENDPOINT, access_token, record).await
    }

    pub async fn create_credential(
        &self,
        access_token: &str,
        record: &CredentialRecord,
    ) -> Result<(), ClientError> {
        self.put_authed(CRED_ENDPOINT, access_token, record).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, endpoint))
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            other => Err(map_status(other)),
        }
    }

    async fn get_authed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        access_token: &str,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, endpoint))
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            other => Err(map_status(other)),
        }
    }

    async fn put_authed<B: Serialize>(
        &self,
        endpoint: &str,
        access_token: &str,
        body: &B,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .put(format!("{}{}", self.base_url, endpoint))
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            other => Err(map_status(other)),
        }
    }
}

#[async_trait::async_trait]
impl RefreshApi for ApiClient {
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, ClientError> {
        self.refresh(refresh_token).await
    }
}
