//! Repository tests against a real MongoDB.
//!
//! Requires Docker: `cargo test -p domain_users -- --ignored`

use domain_users::{
    Authority, AuthorityRepository, MongoAuthorityRepository, MongoUserRepository, PageRequest,
    ROLE_ADMIN, ROLE_USER, Sort, SortField, User, UserError, UserRepository, UserService,
};
use test_utils::{TestDataBuilder, TestMongo};

async fn user_repository(mongo: &TestMongo) -> MongoUserRepository {
    let repo = MongoUserRepository::new(&mongo.database());
    repo.init_indexes().await.unwrap();
    repo
}

fn user(login: &str) -> User {
    User::new(login, format!("{}@example.com", login), "hash")
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unique_indexes_reject_duplicates() {
    let mongo = TestMongo::new().await;
    let repo = user_repository(&mongo).await;

    repo.save(user("alice")).await.unwrap();

    let same_login = User::new("ALICE", "other@example.com", "hash");
    assert!(matches!(
        repo.save(same_login).await,
        Err(UserError::LoginAlreadyUsed)
    ));

    let same_email = User::new("other", "Alice@Example.com", "hash");
    assert!(matches!(
        repo.save(same_email).await,
        Err(UserError::EmailAlreadyUsed)
    ));

    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_find_all_sorts_in_both_directions() {
    let mongo = TestMongo::new().await;
    let repo = user_repository(&mongo).await;

    for login in ["bob", "alice", "carol"] {
        repo.save(user(login)).await.unwrap();
    }

    let asc = repo
        .find_all(Sort::asc(SortField::Login), PageRequest::default())
        .await
        .unwrap();
    let logins: Vec<&str> = asc.iter().map(|u| u.login.as_str()).collect();
    assert_eq!(logins, ["alice", "bob", "carol"]);

    let desc = repo
        .find_all(Sort::desc(SortField::Login), PageRequest::new(Some(0), Some(2)))
        .await
        .unwrap();
    let logins: Vec<&str> = desc.iter().map(|u| u.login.as_str()).collect();
    assert_eq!(logins, ["carol", "bob"]);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_save_delete_round_trip_keeps_count() {
    let mongo = TestMongo::new().await;
    let repo = user_repository(&mongo).await;
    let builder = TestDataBuilder::from_test_name("test_save_delete_round_trip_keeps_count");

    repo.save(user("dave")).await.unwrap();
    let before = repo.count().await.unwrap();

    let login = builder.login("temp");
    let saved = repo
        .save(User::new(&login, builder.email("temp"), "hash"))
        .await
        .unwrap();
    assert!(repo.find_by_id(saved.id.as_deref().unwrap()).await.unwrap().is_some());

    assert!(repo.delete_by_login(&login).await.unwrap());
    assert!(!repo.delete_by_login(&login).await.unwrap());
    assert_eq!(repo.count().await.unwrap(), before);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_authorities_upsert_and_sort() {
    let mongo = TestMongo::new().await;
    let repo = MongoAuthorityRepository::new(&mongo.database());

    repo.save(Authority::new(ROLE_USER)).await.unwrap();
    repo.save(Authority::new(ROLE_ADMIN)).await.unwrap();
    repo.save(Authority::new(ROLE_USER)).await.unwrap();

    assert_eq!(repo.count().await.unwrap(), 2);
    let names: Vec<String> = repo
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, [ROLE_ADMIN, ROLE_USER]);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_public_listing_over_mongo() {
    let mongo = TestMongo::new().await;
    let db = mongo.database();
    let users = user_repository(&mongo).await;
    let service = UserService::new(users, MongoAuthorityRepository::new(&db));
    service.seed_authorities().await.unwrap();

    assert!(service.ensure_admin("admin", "admin@localhost", "admin").await.unwrap());

    let (page, total) = service
        .list_public(Some("login,asc"), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(page[0].login, "admin");
    assert!(!page[0].id.is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_saves_keep_login_unique() {
    let mongo = TestMongo::new().await;
    let repo = user_repository(&mongo).await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                repo.save(User::new("grace", format!("grace{}@example.com", i), "hash"))
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
#[ignore = "requires Docker"]
async fn test_concurrent_authority_inserts_admit_one() {
    let mongo = TestMongo::new().await;
    let repo = MongoAuthorityRepository::new(&mongo.database());

    let (first, second) = tokio::join!(
        repo.insert(Authority::new("ROLE_AUDITOR")),
        repo.insert(Authority::new("ROLE_AUDITOR"))
    );

    assert!(first.is_ok() != second.is_ok());
    let err = first.err().or(second.err()).unwrap();
    assert!(matches!(err, UserError::AuthorityAlreadyExists(_)));
    assert_eq!(repo.count().await.unwrap(), 1);
}
