//! API handlers for the VaultKeeper backend

pub mod auth;
pub mod vault;

pub use auth::{REFRESH_PATH, REFRESH_TOKEN_COOKIE};
