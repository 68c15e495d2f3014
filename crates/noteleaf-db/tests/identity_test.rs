//! Integration tests for the user repository.
//!
//! Requires a running Postgres (see test_fixtures); run with
//! `cargo test -- --ignored`.

use noteleaf_db::test_fixtures::{test_database, unique_email};
use noteleaf_db::{Error, UserRepository};

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_insert_and_find_user() {
    let db = test_database().await;
    let email = unique_email("identity");

    let user = db.users.insert(&email).await.unwrap();
    assert_eq!(user.email, email);

    let by_email = db.users.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    let by_id = db.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, email);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_duplicate_email_maps_to_conflict() {
    let db = test_database().await;
    let email = unique_email("dup");

    db.users.insert(&email).await.unwrap();
    let err = db.users.insert(&email).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "got {:?}", err);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_find_unknown_email_returns_none() {
    let db = test_database().await;
    let missing = db
        .users
        .find_by_email(&unique_email("missing"))
        .await
        .unwrap();
    assert!(missing.is_none());
}
