//! Users Domain
//!
//! User and authority management backed by MongoDB: the admin-only public
//! listing (`{id, login}` only), admin user CRUD, authorities, and the
//! register / activate / authenticate account flow.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, ROLE_ADMIN guard
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Sort allow-lists, validation, password hashing
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← UserRepository / AuthorityRepository (MongoDB, in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← User, Authority, projections
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_users::{MongoAuthorityRepository, MongoUserRepository, UserService, handlers};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("directory");
//!
//! let users = MongoUserRepository::new(&db);
//! users.init_indexes().await?;
//! let service = UserService::new(users, MongoAuthorityRepository::new(&db));
//! service.seed_authorities().await?;
//!
//! let auth = JwtAuth::new(&JwtConfig::new("a-secret-of-at-least-thirty-two-chars"));
//! let router = handlers::router(service, auth);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod sort;

pub use crate::mongodb::{MongoAuthorityRepository, MongoUserRepository};
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{
    AdminUser, AdminUserInput, Authority, PublicUser, ROLE_ADMIN, ROLE_USER, RegisterRequest, User,
};
pub use repository::{
    AuthorityRepository, InMemoryAuthorityRepository, InMemoryUserRepository, UserRepository,
};
pub use service::UserService;
pub use sort::{PageRequest, Sort, SortDirection, SortField};
