//! Authentication for VaultKeeper
//!
//! - Self-contained JWT access tokens, opaque rotating refresh tokens
//! - bcrypt password hashing
//! - Session lifecycle orchestration (sign-up, sign-in, refresh)

mod jwt;
mod password;
mod service;

pub use jwt::{mint_access_token, new_refresh_token, verify_access_token, Claims, JwtError};
pub use password::{hash_password, verify_password, PasswordError};
pub use service::{AuthError, AuthService};
