//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::storage::Storage;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, storage: Arc<dyn Storage>) -> Self {
        Self {
            auth_service,
            storage,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
