use axum_helpers::JwtConfig;
use core_config::{AppInfo, FromEnv, app_info, env_or_default, server::ServerConfig};

// Import MongoDB config from the database library
use database::mongodb::MongoConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Administrator created at startup when no user holds its login.
///
/// Only present when `ADMIN_PASSWORD` is set; `ADMIN_LOGIN` defaults to
/// `admin` and `ADMIN_EMAIL` to `admin@localhost`.
#[derive(Clone)]
pub struct AdminSeed {
    pub login: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("login", &self.login)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl AdminSeed {
    pub fn from_env() -> Option<Self> {
        let password = std::env::var("ADMIN_PASSWORD").ok()?;

        Some(Self {
            login: env_or_default("ADMIN_LOGIN", "admin"),
            email: env_or_default("ADMIN_EMAIL", "admin@localhost"),
            password,
        })
    }
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub admin: Option<AdminSeed>,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?;
        let server = ServerConfig::from_env()?;
        let jwt = JwtConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            mongodb,
            server,
            jwt,
            admin: AdminSeed::from_env(),
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "directory-config-test-secret-32-chars!";

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", Some(SECRET)),
                ("MONGODB_URL", Some("mongodb://db:27017")),
                ("MONGODB_DATABASE", Some("directory")),
                ("PORT", Some("9090")),
                ("APP_ENV", None),
                ("ADMIN_PASSWORD", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.mongodb.url(), "mongodb://db:27017");
                assert_eq!(config.mongodb.database(), "directory");
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.jwt.secret, SECRET);
                assert!(config.admin.is_none());
                assert_eq!(config.environment, Environment::Development);
                assert_eq!(config.app.name, "directory_api");
            },
        );
    }

    #[test]
    fn test_config_requires_jwt_secret() {
        temp_env::with_vars_unset(["JWT_SECRET"], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn test_admin_seed_defaults() {
        temp_env::with_vars(
            [
                ("ADMIN_PASSWORD", Some("change-me")),
                ("ADMIN_LOGIN", None),
                ("ADMIN_EMAIL", None),
            ],
            || {
                let seed = AdminSeed::from_env().unwrap();
                assert_eq!(seed.login, "admin");
                assert_eq!(seed.email, "admin@localhost");
                assert!(!format!("{:?}", seed).contains("change-me"));
            },
        );
    }
}
