//! Stateless JWT authentication and authority checks.
//!
//! ```ignore
//! use axum_helpers::auth::{AuthorityGuard, JwtAuth, JwtConfig, require_authority};
//! use core_config::FromEnv;
//!
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//! let admin = Router::new()
//!     .route("/admin/users", get(list_users))
//!     .layer(axum::middleware::from_fn_with_state(
//!         AuthorityGuard::new(auth, "ROLE_ADMIN"),
//!         require_authority,
//!     ));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use jwt::{JwtAuth, JwtClaims};
pub use middleware::{AuthorityGuard, require_authority};
