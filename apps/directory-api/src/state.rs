//! Application state management.
//!
//! Shared by the route builders in [`crate::api`]: configuration, the MongoDB
//! client used for readiness probes, and the directory database.

use axum_helpers::JwtAuth;
use mongodb::{Client, Database};

/// Shared application state.
///
/// Cloning is cheap: the MongoDB handles share one connection pool and
/// `JwtAuth` holds its keys behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// MongoDB client (cloneable, shares underlying connection pool)
    pub mongo_client: Client,
    /// MongoDB database instance
    pub db: Database,
    /// Token issuer and verifier
    pub auth: JwtAuth,
}
