//! Secret record HTTP handlers
//!
//! Thin CRUD over the vault store. Every handler runs behind the auth gate;
//! `AuthenticatedUser` scopes all queries to the token's owner.

use axum::{extract::State, Json};

use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::models::{CardRecord, CredentialRecord, TextRecord};
use crate::state::AppState;
use crate::storage::VaultStore;

// Text records

/// GET /api/materials/text
pub async fn list_text(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<TextRecord>>> {
    let records = state.storage.list_text(user.user_id).await?;
    Ok(Json(records))
}

/// PUT /api/materials/text
pub async fn create_text(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(record): Json<TextRecord>,
) -> ApiResult<()> {
    state.storage.create_text(user.user_id, &record).await?;
    Ok(())
}

/// POST /api/materials/text
pub async fn update_text(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(record): Json<TextRecord>,
) -> ApiResult<()> {
    state.storage.update_text(user.user_id, &record).await?;
    Ok(())
}

// Card records

/// GET /api/materials/card
pub async fn list_cards(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<CardRecord>>> {
    let records = state.storage.list_cards(user.user_id).await?;
    Ok(Json(records))
}

/// PUT /api/materials/card
pub async fn create_card(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(record): Json<CardRecord>,
) -> ApiResult<()> {
    state.storage.create_card(user.user_id, &record).await?;
    Ok(())
}

/// POST /api/materials/card
pub async fn update_card(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(record): Json<CardRecord>,
) -> ApiResult<()> {
    state.storage.update_card(user.user_id, &record).await?;
    Ok(())
}

// Credential records

/// GET /api/materials/cred
pub async fn list_credentials(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<CredentialRecord>>> {
    let records = state.storage.list_credentials(user.user_id).await?;
    Ok(Json(records))
}

/// PUT /api/materials/cred
pub async fn create_credential(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(record): Json<CredentialRecord>,
) -> ApiResult<()> {
    state
        .storage
        .create_credential(user.user_id, &record)
        .await?;
    Ok(())
}

/// POST /api/materials/cred
pub async fn update_credential(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(record): Json<CredentialRecord>,
) -> ApiResult<()> {
    state
        .storage
        .update_credential(user.user_id, &record)
        .await?;
    Ok(())
}
