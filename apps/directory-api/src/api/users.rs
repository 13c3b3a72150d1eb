//! Users API routes
//!
//! Wires the users domain to MongoDB and HTTP.

use axum::Router;
use domain_users::{MongoAuthorityRepository, MongoUserRepository, UserService, handlers};

use crate::state::AppState;

pub type DirectoryService = UserService<MongoUserRepository, MongoAuthorityRepository>;

pub fn service(state: &AppState) -> DirectoryService {
    UserService::new(
        MongoUserRepository::new(&state.db),
        MongoAuthorityRepository::new(&state.db),
    )
}

/// Create unique indexes, seed the built-in roles and the optional administrator
pub async fn bootstrap(state: &AppState) -> eyre::Result<()> {
    MongoUserRepository::new(&state.db).init_indexes().await?;

    let service = service(state);
    service.seed_authorities().await?;

    if let Some(admin) = &state.config.admin {
        let created = service
            .ensure_admin(&admin.login, &admin.email, &admin.password)
            .await?;
        if created {
            tracing::info!(login = %admin.login, "Administrator account created");
        }
    }

    Ok(())
}

pub fn router(state: &AppState) -> Router {
    handlers::router(service(state), state.auth.clone())
}
