use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{Authority, User, new_user_id};
use crate::sort::{PageRequest, Sort};

/// Repository trait for User persistence
///
/// Implementations enforce login and email uniqueness themselves so that two
/// concurrent saves cannot both succeed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or replace by id, assigning an id when absent.
    ///
    /// Fails with `LoginAlreadyUsed` / `EmailAlreadyUsed` when another id
    /// already holds the login or email.
    async fn save(&self, user: User) -> UserResult<User>;

    /// Number of stored users
    async fn count(&self) -> UserResult<u64>;

    /// One page of users in the requested order
    async fn find_all(&self, sort: Sort, page: PageRequest) -> UserResult<Vec<User>>;

    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>>;

    /// Case-insensitive
    async fn find_by_login(&self, login: &str) -> UserResult<Option<User>>;

    /// Case-insensitive
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    async fn find_by_activation_key(&self, key: &str) -> UserResult<Option<User>>;

    /// Returns whether a user was removed; absent logins are not an error
    async fn delete_by_login(&self, login: &str) -> UserResult<bool>;
}

/// Repository trait for Authority persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorityRepository: Send + Sync {
    /// Insert, or overwrite the authority with the same name
    async fn save(&self, authority: Authority) -> UserResult<Authority>;

    /// Insert a new authority; fails with `AuthorityAlreadyExists` when the
    /// name is taken, even against a concurrent insert
    async fn insert(&self, authority: Authority) -> UserResult<Authority>;

    /// All authorities ordered by name
    async fn find_all(&self) -> UserResult<Vec<Authority>>;

    async fn count(&self) -> UserResult<u64>;

    async fn find_by_name(&self, name: &str) -> UserResult<Option<Authority>>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, mut user: User) -> UserResult<User> {
        user.normalize();
        let id = user.id.get_or_insert_with(new_user_id).clone();

        // Check and write under one lock so concurrent saves cannot race
        let mut users = self.users.write().await;

        let others = users.values().filter(|u| u.id.as_deref() != Some(id.as_str()));
        for other in others {
            if other.login == user.login {
                return Err(UserError::LoginAlreadyUsed);
            }
            if other.email == user.email {
                return Err(UserError::EmailAlreadyUsed);
            }
        }

        users.insert(id.clone(), user.clone());

        tracing::info!(user_id = %id, login = %user.login, "Saved user");
        Ok(user)
    }

    async fn count(&self) -> UserResult<u64> {
        let users = self.users.read().await;
        Ok(users.len() as u64)
    }

    async fn find_all(&self, sort: Sort, page: PageRequest) -> UserResult<Vec<User>> {
        let users = self.users.read().await;

        let mut result: Vec<User> = users.values().cloned().collect();
        result.sort_by(|a, b| sort.compare(a, b));

        let result = result
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect();

        Ok(result)
    }

    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> UserResult<Option<User>> {
        let login = login.to_lowercase();
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.login == login).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let email = email.to_lowercase();
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_activation_key(&self, key: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        let user = users
            .values()
            .find(|u| u.activation_key.as_deref() == Some(key))
            .cloned();
        Ok(user)
    }

    async fn delete_by_login(&self, login: &str) -> UserResult<bool> {
        let login = login.to_lowercase();
        let mut users = self.users.write().await;

        let id = users
            .iter()
            .find(|(_, u)| u.login == login)
            .map(|(id, _)| id.clone());

        match id {
            Some(id) => {
                users.remove(&id);
                tracing::info!(user_id = %id, login = %login, "Deleted user");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory implementation of AuthorityRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuthorityRepository {
    authorities: Arc<RwLock<HashMap<String, Authority>>>,
}

impl InMemoryAuthorityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorityRepository for InMemoryAuthorityRepository {
    async fn save(&self, authority: Authority) -> UserResult<Authority> {
        let mut authorities = self.authorities.write().await;
        authorities.insert(authority.name.clone(), authority.clone());
        Ok(authority)
    }

    async fn insert(&self, authority: Authority) -> UserResult<Authority> {
        let mut authorities = self.authorities.write().await;
        if authorities.contains_key(&authority.name) {
            return Err(UserError::AuthorityAlreadyExists(authority.name));
        }
        authorities.insert(authority.name.clone(), authority.clone());
        Ok(authority)
    }

    async fn find_all(&self) -> UserResult<Vec<Authority>> {
        let authorities = self.authorities.read().await;
        let mut result: Vec<Authority> = authorities.values().cloned().collect();
        result.sort();
        Ok(result)
    }

    async fn count(&self) -> UserResult<u64> {
        let authorities = self.authorities.read().await;
        Ok(authorities.len() as u64)
    }

    async fn find_by_name(&self, name: &str) -> UserResult<Option<Authority>> {
        let authorities = self.authorities.read().await;
        Ok(authorities.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortField;

    fn user(login: &str) -> User {
        User::new(login, format!("{}@example.com", login), "hash")
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_normalizes() {
        let repo = InMemoryUserRepository::new();

        let saved = repo.save(User::new("Alice", "ALICE@example.com", "h")).await.unwrap();
        assert!(saved.id.is_some());
        assert_eq!(saved.login, "alice");

        let fetched = repo.find_by_login("ALICE").await.unwrap();
        assert_eq!(fetched.unwrap().id, saved.id);

        let fetched = repo.find_by_email("Alice@Example.com").await.unwrap();
        assert!(fetched.is_some()); // Case insensitive
    }

    #[tokio::test]
    async fn test_save_with_existing_id_replaces() {
        let repo = InMemoryUserRepository::new();

        let mut saved = repo.save(user("bob")).await.unwrap();
        saved.first_name = Some("Bob".to_string());
        repo.save(saved.clone()).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let fetched = repo.find_by_id(saved.id.as_deref().unwrap()).await.unwrap();
        assert_eq!(fetched.unwrap().first_name.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn test_duplicate_login_and_email_are_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.save(user("carol")).await.unwrap();

        let same_login = User::new("CAROL", "other@example.com", "h");
        assert!(matches!(
            repo.save(same_login).await,
            Err(UserError::LoginAlreadyUsed)
        ));

        let same_email = User::new("other", "carol@example.com", "h");
        assert!(matches!(
            repo.save(same_email).await,
            Err(UserError::EmailAlreadyUsed)
        ));

        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_all_sorts_and_pages() {
        let repo = InMemoryUserRepository::new();
        for login in ["bob", "alice", "carol"] {
            repo.save(user(login)).await.unwrap();
        }

        let page = repo
            .find_all(Sort::desc(SortField::Login), PageRequest::new(Some(0), Some(2)))
            .await
            .unwrap();
        let logins: Vec<&str> = page.iter().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, ["carol", "bob"]);

        let page = repo
            .find_all(Sort::desc(SortField::Login), PageRequest::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].login, "alice");
    }

    #[tokio::test]
    async fn test_delete_by_login() {
        let repo = InMemoryUserRepository::new();
        repo.save(user("dave")).await.unwrap();

        assert!(!repo.delete_by_login("nobody").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);

        assert!(repo.delete_by_login("Dave").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_by_activation_key() {
        let repo = InMemoryUserRepository::new();
        let mut pending = user("erin");
        pending.activation_key = Some("k-1".to_string());
        repo.save(pending).await.unwrap();

        assert!(repo.find_by_activation_key("k-1").await.unwrap().is_some());
        assert!(repo.find_by_activation_key("k-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authority_save_is_idempotent() {
        let repo = InMemoryAuthorityRepository::new();
        repo.save(Authority::new("ROLE_USER")).await.unwrap();
        repo.save(Authority::new("ROLE_ADMIN")).await.unwrap();
        repo.save(Authority::new("ROLE_USER")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        let names: Vec<String> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, ["ROLE_ADMIN", "ROLE_USER"]);
        assert!(repo.find_by_name("ROLE_NONE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_saves_keep_login_unique() {
        let repo = InMemoryUserRepository::new();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.save(User::new("grace", format!("grace{}@example.com", i), "h"))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(matches!(err, UserError::LoginAlreadyUsed)),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_authority_inserts_admit_one() {
        let repo = InMemoryAuthorityRepository::new();

        let (first, second) = tokio::join!(
            repo.insert(Authority::new("ROLE_AUDITOR")),
            repo.insert(Authority::new("ROLE_AUDITOR"))
        );

        assert!(first.is_ok() != second.is_ok());
        let err = first.err().or(second.err()).unwrap();
        assert!(matches!(err, UserError::AuthorityAlreadyExists(name) if name == "ROLE_AUDITOR"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
