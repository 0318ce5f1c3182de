//! VaultKeeper
//!
//! Personal-vault service: authenticated users store and retrieve small
//! secret records. The server issues short-lived JWT access tokens and
//! long-lived rotating refresh tokens; the client keeps a session alive
//! with a background renewal loop feeding a single-threaded UI event loop.

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;
