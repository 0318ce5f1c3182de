//! Middleware for the VaultKeeper API

pub mod auth;
mod tracing;

pub use auth::{AuthenticatedUser, ACCESS_TOKEN_COOKIE};
pub use tracing::request_tracing;
