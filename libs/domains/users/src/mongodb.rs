//! MongoDB implementations of UserRepository and AuthorityRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{Authority, User, new_user_id};
use crate::repository::{AuthorityRepository, UserRepository};
use crate::sort::{PageRequest, Sort, SortDirection, SortField};

pub const USER_COLLECTION: &str = "jhi_user";
pub const AUTHORITY_COLLECTION: &str = "jhi_authority";

const LOGIN_INDEX: &str = "idx_login_unique";
const EMAIL_INDEX: &str = "idx_email_unique";
const DUPLICATE_KEY: i32 = 11000;

/// MongoDB implementation of the UserRepository
#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, USER_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<User>(collection_name);
        Self { collection }
    }

    /// Create the unique login/email indexes that back conflict detection
    pub async fn init_indexes(&self) -> UserResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "login": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name(LOGIN_INDEX.to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name(EMAIL_INDEX.to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "activation_key": 1 })
                .options(
                    IndexOptions::builder()
                        .sparse(true)
                        .name("idx_activation_key".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("User indexes created successfully");
        Ok(())
    }

    pub fn collection(&self) -> &Collection<User> {
        &self.collection
    }

    fn sort_document(sort: Sort) -> Document {
        let direction = match sort.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        };

        let mut document = Document::new();
        document.insert(sort.field.document_field(), direction);
        if sort.field != SortField::Id {
            document.insert("_id", 1);
        }
        document
    }
}

/// Turn a duplicate-key write failure into the matching conflict
fn map_write_error(err: mongodb::error::Error) -> UserError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
            classify_duplicate(&write.message)
        }
        _ => UserError::from(err),
    }
}

fn classify_duplicate(message: &str) -> UserError {
    if message.contains(LOGIN_INDEX) {
        UserError::LoginAlreadyUsed
    } else if message.contains(EMAIL_INDEX) {
        UserError::EmailAlreadyUsed
    } else {
        UserError::Database(message.to_string())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(login = %user.login))]
    async fn save(&self, mut user: User) -> UserResult<User> {
        user.normalize();

        match user.id.clone() {
            None => {
                let id = new_user_id();
                user.id = Some(id.clone());
                self.collection
                    .insert_one(&user)
                    .await
                    .map_err(map_write_error)?;
                tracing::info!(user_id = %id, "User created");
            }
            Some(id) => {
                self.collection
                    .replace_one(doc! { "_id": id.as_str() }, &user)
                    .upsert(true)
                    .await
                    .map_err(map_write_error)?;
                tracing::info!(user_id = %id, "User saved");
            }
        }

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn count(&self) -> UserResult<u64> {
        let count = self.collection.count_documents(doc! {}).await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn find_all(&self, sort: Sort, page: PageRequest) -> UserResult<Vec<User>> {
        let options = FindOptions::builder()
            .sort(Self::sort_document(sort))
            .skip(page.offset())
            .limit(page.size as i64)
            .build();

        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        let users: Vec<User> = cursor.try_collect().await?;

        Ok(users)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        let user = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_login(&self, login: &str) -> UserResult<Option<User>> {
        let filter = doc! { "login": login.to_lowercase() };
        let user = self.collection.find_one(filter).await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let filter = doc! { "email": email.to_lowercase() };
        let user = self.collection.find_one(filter).await?;
        Ok(user)
    }

    #[instrument(skip(self, key))]
    async fn find_by_activation_key(&self, key: &str) -> UserResult<Option<User>> {
        let user = self
            .collection
            .find_one(doc! { "activation_key": key })
            .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn delete_by_login(&self, login: &str) -> UserResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "login": login.to_lowercase() })
            .await?;

        if result.deleted_count > 0 {
            tracing::info!(login = %login, "User deleted");
        }
        Ok(result.deleted_count > 0)
    }
}

/// Stored shape of an authority; the name is the primary key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AuthorityDocument {
    #[serde(rename = "_id")]
    name: String,
}

impl From<AuthorityDocument> for Authority {
    fn from(document: AuthorityDocument) -> Self {
        Authority::new(document.name)
    }
}

/// MongoDB implementation of the AuthorityRepository
#[derive(Clone)]
pub struct MongoAuthorityRepository {
    collection: Collection<AuthorityDocument>,
}

impl MongoAuthorityRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, AUTHORITY_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<AuthorityDocument>(collection_name);
        Self { collection }
    }
}

#[async_trait]
impl AuthorityRepository for MongoAuthorityRepository {
    #[instrument(skip(self), fields(name = %authority.name))]
    async fn save(&self, authority: Authority) -> UserResult<Authority> {
        let document = AuthorityDocument {
            name: authority.name.clone(),
        };
        self.collection
            .replace_one(doc! { "_id": authority.name.as_str() }, &document)
            .upsert(true)
            .await?;
        Ok(authority)
    }

    #[instrument(skip(self), fields(name = %authority.name))]
    async fn insert(&self, authority: Authority) -> UserResult<Authority> {
        let document = AuthorityDocument {
            name: authority.name.clone(),
        };
        self.collection
            .insert_one(&document)
            .await
            .map_err(|err| match err.kind.as_ref() {
                ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
                    UserError::AuthorityAlreadyExists(authority.name.clone())
                }
                _ => UserError::from(err),
            })?;
        tracing::info!("Authority created");
        Ok(authority)
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> UserResult<Vec<Authority>> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        let documents: Vec<AuthorityDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Authority::from).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> UserResult<u64> {
        let count = self.collection.count_documents(doc! {}).await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> UserResult<Option<Authority>> {
        let document = self.collection.find_one(doc! { "_id": name }).await?;
        Ok(document.map(Authority::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_duplicate_by_index_name() {
        let login = "E11000 duplicate key error collection: directory.jhi_user index: idx_login_unique dup key: { login: \"alice\" }";
        assert!(matches!(
            classify_duplicate(login),
            UserError::LoginAlreadyUsed
        ));

        let email = "E11000 duplicate key error collection: directory.jhi_user index: idx_email_unique dup key: { email: \"a@b.c\" }";
        assert!(matches!(
            classify_duplicate(email),
            UserError::EmailAlreadyUsed
        ));

        let id = "E11000 duplicate key error collection: directory.jhi_user index: _id_ dup key: { _id: \"x\" }";
        assert!(matches!(classify_duplicate(id), UserError::Database(_)));
    }

    #[test]
    fn test_sort_document_adds_id_tiebreak() {
        let document = MongoUserRepository::sort_document(Sort::desc(SortField::Login));
        assert_eq!(document, doc! { "login": -1, "_id": 1 });

        let document = MongoUserRepository::sort_document(Sort::desc(SortField::Id));
        assert_eq!(document, doc! { "_id": -1 });

        let document = MongoUserRepository::sort_document(Sort::asc(SortField::CreatedDate));
        assert_eq!(document, doc! { "created_date": 1, "_id": 1 });
    }
}
