use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_USER: &str = "ROLE_USER";

pub const DEFAULT_LANG_KEY: &str = "en";

pub const LOGIN_MAX_LEN: usize = 50;

/// Named role grantable to a user
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Validate, ToSchema)]
pub struct Authority {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
}

impl Authority {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Stored user record.
///
/// This is the persistence shape; API responses go through [`PublicUser`] or
/// [`AdminUser`] so that credentials never leave the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Assigned by the store on first save
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Always lower-case
    pub login: String,
    /// Always lower-case
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub lang_key: String,
    pub activated: bool,
    pub activation_key: Option<String>,
    pub password_hash: String,
    #[serde(default)]
    pub authorities: BTreeSet<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_date: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_modified_date: DateTime<Utc>,
}

impl User {
    /// Unsaved, not yet activated user with no authorities
    pub fn new(
        login: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        let mut user = Self {
            id: None,
            login: login.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            image_url: None,
            lang_key: DEFAULT_LANG_KEY.to_string(),
            activated: false,
            activation_key: None,
            password_hash: password_hash.into(),
            authorities: BTreeSet::new(),
            created_date: now,
            last_modified_date: now,
        };
        user.normalize();
        user
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authorities.insert(authority.into());
        self
    }

    pub fn activated(mut self) -> Self {
        self.activated = true;
        self.activation_key = None;
        self
    }

    /// Lower-case login and email so uniqueness is case-insensitive
    pub fn normalize(&mut self) {
        self.login = self.login.to_lowercase();
        self.email = self.email.to_lowercase();
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

/// Current time at the millisecond precision BSON dates keep
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Fresh id for a user document; v7 so ids sort by creation time
pub fn new_user_id() -> String {
    Uuid::now_v7().to_string()
}

/// Random key mailed to the user to confirm registration
pub fn new_activation_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Restricted view served by `GET /api/users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: String,
    pub login: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone().unwrap_or_default(),
            login: user.login.clone(),
        }
    }
}

/// Full profile served to administrators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub login: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub image_url: Option<String>,
    pub activated: bool,
    pub lang_key: String,
    pub authorities: Vec<String>,
    pub created_date: DateTime<Utc>,
    pub last_modified_date: DateTime<Utc>,
}

impl From<User> for AdminUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            login: user.login,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            image_url: user.image_url,
            activated: user.activated,
            lang_key: user.lang_key,
            authorities: user.authorities.into_iter().collect(),
            created_date: user.created_date,
            last_modified_date: user.last_modified_date,
        }
    }
}

/// Login names: letters, digits and `_ . @ -`
pub fn validate_login(login: &str) -> Result<(), ValidationError> {
    let valid = !login.is_empty()
        && login.len() <= LOGIN_MAX_LEN
        && login
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '-'));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("login")
            .with_message("login may only contain letters, digits and _ . @ -".into()))
    }
}

/// Body of `POST /api/admin/users` and `PUT /api/admin/users/{login}`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserInput {
    #[validate(custom(function = "validate_login"))]
    pub login: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(max = 50))]
    pub first_name: Option<String>,
    #[validate(length(max = 50))]
    pub last_name: Option<String>,
    #[validate(length(max = 256))]
    pub image_url: Option<String>,
    #[serde(default = "default_lang_key")]
    #[validate(length(min = 2, max = 10))]
    pub lang_key: String,
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub authorities: BTreeSet<String>,
}

/// Body of `POST /api/register`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(custom(function = "validate_login"))]
    pub login: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 4, max = 100))]
    pub password: String,
    #[serde(default = "default_lang_key")]
    #[validate(length(min = 2, max = 10))]
    pub lang_key: String,
}

/// Body of `POST /api/authenticate`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 4, max = 100))]
    pub password: String,
}

/// Issued access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub id_token: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivationQuery {
    /// Key from the activation mail
    pub key: String,
}

/// Paging and ordering for user listings
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// `<field>,<asc|desc>`, e.g. `login,desc`; defaults to `id,asc`
    pub sort: Option<String>,
    /// Zero-based page index
    pub page: Option<u64>,
    /// Page size, default 20. Larger values are clamped to 100, so read
    /// `X-Total-Count` and page through listings with more users.
    #[param(minimum = 1, maximum = 100, default = 20)]
    pub size: Option<u64>,
}

fn default_lang_key() -> String {
    DEFAULT_LANG_KEY.to_string()
}
