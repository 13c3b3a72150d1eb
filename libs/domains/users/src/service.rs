//! User Service - Business logic layer

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{
    AdminUser, AdminUserInput, Authority, PublicUser, ROLE_ADMIN, ROLE_USER, RegisterRequest,
    User, new_activation_key, now_millis,
};
use crate::repository::{AuthorityRepository, UserRepository};
use crate::sort::{PageRequest, Sort, SortField};

/// User directory operations over a user store and an authority store
pub struct UserService<U: UserRepository, A: AuthorityRepository> {
    users: Arc<U>,
    authorities: Arc<A>,
}

impl<U: UserRepository, A: AuthorityRepository> Clone for UserService<U, A> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            authorities: Arc::clone(&self.authorities),
        }
    }
}

impl<U: UserRepository, A: AuthorityRepository> UserService<U, A> {
    pub fn new(users: U, authorities: A) -> Self {
        Self {
            users: Arc::new(users),
            authorities: Arc::new(authorities),
        }
    }

    /// Every user reduced to `{id, login}`, plus the total user count.
    ///
    /// Only `id` and `login` are accepted as sort fields.
    #[instrument(skip(self))]
    pub async fn list_public(
        &self,
        sort: Option<&str>,
        page: PageRequest,
    ) -> UserResult<(Vec<PublicUser>, u64)> {
        let sort = Sort::parse(sort, SortField::PUBLIC)?;
        let users = self.users.find_all(sort, page).await?;
        let total = self.users.count().await?;

        Ok((users.iter().map(PublicUser::from).collect(), total))
    }

    /// Full profiles for administrators
    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        sort: Option<&str>,
        page: PageRequest,
    ) -> UserResult<(Vec<AdminUser>, u64)> {
        let sort = Sort::parse(sort, SortField::ADMIN)?;
        let users = self.users.find_all(sort, page).await?;
        let total = self.users.count().await?;

        Ok((users.into_iter().map(AdminUser::from).collect(), total))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, login: &str) -> UserResult<AdminUser> {
        self.users
            .find_by_login(login)
            .await?
            .map(AdminUser::from)
            .ok_or_else(|| UserError::NotFound(login.to_lowercase()))
    }

    #[instrument(skip(self))]
    pub async fn count_users(&self) -> UserResult<u64> {
        self.users.count().await
    }

    /// Create an activated user with an unusable random password
    #[instrument(skip(self, input), fields(login = %input.login))]
    pub async fn create_user(&self, input: AdminUserInput) -> UserResult<AdminUser> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;
        self.ensure_authorities_exist(input.authorities.iter())
            .await?;

        let password_hash = hash_password(&Uuid::new_v4().to_string())?;
        let mut user = User::new(&input.login, &input.email, password_hash).activated();
        apply_profile(&mut user, input);

        let saved = self.users.save(user).await?;
        tracing::info!(login = %saved.login, "Created user");
        Ok(saved.into())
    }

    /// Replace the profile of `login`, which may itself be renamed
    #[instrument(skip(self, input))]
    pub async fn update_user(&self, login: &str, input: AdminUserInput) -> UserResult<AdminUser> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        let mut user = self
            .users
            .find_by_login(login)
            .await?
            .ok_or_else(|| UserError::NotFound(login.to_lowercase()))?;

        self.ensure_authorities_exist(input.authorities.iter())
            .await?;

        user.login = input.login.clone();
        user.email = input.email.clone();
        if input.activated {
            user.activation_key = None;
        }
        user.activated = input.activated;
        user.last_modified_date = now_millis();
        apply_profile(&mut user, input);

        let saved = self.users.save(user).await?;
        Ok(saved.into())
    }

    /// Absent logins are a no-op
    #[instrument(skip(self))]
    pub async fn delete_user(&self, login: &str) -> UserResult<()> {
        if !self.users.delete_by_login(login).await? {
            tracing::debug!(login = %login, "Delete of unknown user ignored");
        }
        Ok(())
    }

    /// Store a not yet activated account holding `ROLE_USER`.
    ///
    /// An earlier registration that was never activated does not block the
    /// login or email; it is removed first.
    #[instrument(skip(self, request), fields(login = %request.login))]
    pub async fn register(&self, request: RegisterRequest) -> UserResult<User> {
        request
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        if let Some(existing) = self.users.find_by_login(&request.login).await? {
            if existing.activated {
                return Err(UserError::LoginAlreadyUsed);
            }
            self.users.delete_by_login(&existing.login).await?;
        }

        if let Some(existing) = self.users.find_by_email(&request.email).await? {
            if existing.activated {
                return Err(UserError::EmailAlreadyUsed);
            }
            self.users.delete_by_login(&existing.login).await?;
        }

        let password_hash = hash_password(&request.password)?;
        let mut user =
            User::new(request.login, request.email, password_hash).with_authority(ROLE_USER);
        user.lang_key = request.lang_key;
        user.activation_key = Some(new_activation_key());

        let saved = self.users.save(user).await?;
        tracing::info!(login = %saved.login, "Registered user");
        Ok(saved)
    }

    #[instrument(skip(self, key))]
    pub async fn activate(&self, key: &str) -> UserResult<AdminUser> {
        let user = self
            .users
            .find_by_activation_key(key)
            .await?
            .ok_or(UserError::InvalidActivationKey)?;

        let mut user = user.activated();
        user.last_modified_date = now_millis();

        let saved = self.users.save(user).await?;
        tracing::info!(login = %saved.login, "Activated user");
        Ok(saved.into())
    }

    /// Check credentials of an activated user
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, login: &str, password: &str) -> UserResult<User> {
        let user = self
            .users
            .find_by_login(login)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !user.activated {
            tracing::info!(login = %user.login, "Login attempt for inactive user");
            return Err(UserError::InvalidCredentials);
        }

        if !verify_password(password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn list_authorities(&self) -> UserResult<Vec<Authority>> {
        self.authorities.find_all().await
    }

    #[instrument(skip(self))]
    pub async fn get_authority(&self, name: &str) -> UserResult<Authority> {
        self.authorities
            .find_by_name(name)
            .await?
            .ok_or_else(|| UserError::AuthorityNotFound(name.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn create_authority(&self, authority: Authority) -> UserResult<Authority> {
        authority
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        self.authorities.insert(authority).await
    }

    /// Make sure the built-in roles exist
    #[instrument(skip(self))]
    pub async fn seed_authorities(&self) -> UserResult<()> {
        for name in [ROLE_ADMIN, ROLE_USER] {
            self.authorities.save(Authority::new(name)).await?;
        }
        tracing::info!("Authorities seeded");
        Ok(())
    }

    /// Create an activated administrator unless `login` already exists
    #[instrument(skip(self, password))]
    pub async fn ensure_admin(&self, login: &str, email: &str, password: &str) -> UserResult<bool> {
        if self.users.find_by_login(login).await?.is_some() {
            return Ok(false);
        }

        let user = User::new(login, email, hash_password(password)?)
            .with_authority(ROLE_ADMIN)
            .with_authority(ROLE_USER)
            .activated();
        self.users.save(user).await?;

        tracing::info!(login = %login, "Created administrator");
        Ok(true)
    }

    async fn ensure_authorities_exist<'a>(
        &self,
        names: impl Iterator<Item = &'a String>,
    ) -> UserResult<()> {
        for name in names {
            if self.authorities.find_by_name(name).await?.is_none() {
                return Err(UserError::AuthorityNotFound(name.clone()));
            }
        }
        Ok(())
    }
}

fn apply_profile(user: &mut User, input: AdminUserInput) {
    user.first_name = input.first_name;
    user.last_name = input.last_name;
    user.image_url = input.image_url;
    user.lang_key = input.lang_key;
    user.authorities = input.authorities;
}

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
