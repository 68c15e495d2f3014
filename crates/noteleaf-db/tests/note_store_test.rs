//! Integration tests for the note repository: CRUD, status lifecycle,
//! ownership scoping, filtering, and ordering.
//!
//! Requires a running Postgres (see test_fixtures); run with
//! `cargo test -- --ignored`.

use noteleaf_db::test_fixtures::{test_database, unique_email};
use noteleaf_db::{
    CreateNoteRequest, Database, Error, ListNotesRequest, NoteRepository, NoteStatus,
    UpdateNoteRequest, UserRepository,
};
use uuid::Uuid;

async fn new_user(db: &Database, prefix: &str) -> Uuid {
    db.users.insert(&unique_email(prefix)).await.unwrap().id
}

fn titled(title: &str) -> CreateNoteRequest {
    CreateNoteRequest {
        title: title.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_insert_then_fetch_round_trips() {
    let db = test_database().await;
    let owner = new_user(&db, "crud").await;

    let created = db
        .notes
        .insert(
            owner,
            CreateNoteRequest {
                title: "T1".to_string(),
                content: "body".to_string(),
                tags: vec!["work".to_string(), "personal".to_string()],
            },
        )
        .await
        .unwrap();

    let fetched = db.notes.fetch(owner, created.id).await.unwrap();
    assert_eq!(fetched.title, "T1");
    assert_eq!(fetched.content, "body");
    assert_eq!(fetched.tags, vec!["work", "personal"]);
    assert_eq!(fetched.status, NoteStatus::Active);
    assert!(!fetched.is_favorite);
    assert_eq!(fetched.created_at, fetched.updated_at);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_partial_update_bumps_updated_at() {
    let db = test_database().await;
    let owner = new_user(&db, "update").await;
    let note = db.notes.insert(owner, titled("before")).await.unwrap();

    let updated = db
        .notes
        .update(
            owner,
            note.id,
            UpdateNoteRequest {
                content: Some("new body".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "before");
    assert_eq!(updated.content, "new body");
    assert!(updated.updated_at > note.updated_at);
    assert_eq!(updated.created_at, note.created_at);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_status_cycle_and_unchanged_set_both_bump_updated_at() {
    let db = test_database().await;
    let owner = new_user(&db, "status").await;
    let note = db.notes.insert(owner, titled("T")).await.unwrap();

    let archived = db
        .notes
        .set_status(owner, note.id, NoteStatus::Archived)
        .await
        .unwrap();
    assert_eq!(archived.status, NoteStatus::Archived);
    assert!(archived.updated_at > note.updated_at);

    let restored = db
        .notes
        .set_status(owner, note.id, NoteStatus::Active)
        .await
        .unwrap();
    assert_eq!(restored.status, NoteStatus::Active);
    assert!(restored.updated_at > archived.updated_at);

    // Unchanged value is a valid call and still bumps updated_at.
    let same = db
        .notes
        .set_status(owner, note.id, NoteStatus::Active)
        .await
        .unwrap();
    assert_eq!(same.status, NoteStatus::Active);
    assert!(same.updated_at > restored.updated_at);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_set_favorite_is_idempotent_in_value() {
    let db = test_database().await;
    let owner = new_user(&db, "favorite").await;
    let note = db.notes.insert(owner, titled("T")).await.unwrap();

    let first = db.notes.set_favorite(owner, note.id, true).await.unwrap();
    assert!(first.is_favorite);
    let second = db.notes.set_favorite(owner, note.id, true).await.unwrap();
    assert!(second.is_favorite);
    assert!(second.updated_at > first.updated_at);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_cross_user_access_yields_not_found() {
    let db = test_database().await;
    let user_a = new_user(&db, "owner-a").await;
    let user_b = new_user(&db, "owner-b").await;
    let note = db.notes.insert(user_a, titled("secret")).await.unwrap();

    let err = db.notes.fetch(user_b, note.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = db
        .notes
        .update(
            user_b,
            note.id,
            UpdateNoteRequest {
                title: Some("stolen".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = db.notes.delete(user_b, note.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // Still intact for the owner.
    let fetched = db.notes.fetch(user_a, note.id).await.unwrap();
    assert_eq!(fetched.title, "secret");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_delete_is_terminal() {
    let db = test_database().await;
    let owner = new_user(&db, "delete").await;
    let note = db.notes.insert(owner, titled("T")).await.unwrap();

    db.notes.delete(owner, note.id).await.unwrap();
    let err = db.notes.fetch(owner, note.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = db.notes.delete(owner, note.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_list_filters_by_status_favorite_and_tag() {
    let db = test_database().await;
    let owner = new_user(&db, "filter").await;
    let other = new_user(&db, "filter-other").await;

    let archived = db.notes.insert(owner, titled("archived")).await.unwrap();
    db.notes
        .set_status(owner, archived.id, NoteStatus::Archived)
        .await
        .unwrap();

    let fav = db
        .notes
        .insert(
            owner,
            CreateNoteRequest {
                title: "fav".to_string(),
                content: String::new(),
                tags: vec!["work".to_string()],
            },
        )
        .await
        .unwrap();
    db.notes.set_favorite(owner, fav.id, true).await.unwrap();

    db.notes
        .insert(
            owner,
            CreateNoteRequest {
                title: "tagged-upper".to_string(),
                content: String::new(),
                tags: vec!["Work".to_string()],
            },
        )
        .await
        .unwrap();

    db.notes.insert(other, titled("foreign")).await.unwrap();

    let archived_list = db
        .notes
        .list(
            owner,
            ListNotesRequest {
                status: Some(NoteStatus::Archived),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(archived_list.len(), 1);
    assert_eq!(archived_list[0].title, "archived");

    let favorites = db
        .notes
        .list(
            owner,
            ListNotesRequest {
                favorite: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].title, "fav");

    // Tag matching is exact and case-sensitive.
    let tagged = db
        .notes
        .list(
            owner,
            ListNotesRequest {
                tag: Some("work".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].title, "fav");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_list_orders_newest_first_with_pagination() {
    let db = test_database().await;
    let owner = new_user(&db, "order").await;

    for title in ["first", "second", "third"] {
        db.notes.insert(owner, titled(title)).await.unwrap();
    }

    let all = db
        .notes
        .list(owner, ListNotesRequest::default())
        .await
        .unwrap();
    let titles: Vec<&str> = all.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["third", "second", "first"]);

    let page = db
        .notes
        .list(
            owner,
            ListNotesRequest {
                limit: Some(1),
                offset: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "second");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_list_recent_includes_fresh_notes() {
    let db = test_database().await;
    let owner = new_user(&db, "recent").await;
    db.notes.insert(owner, titled("fresh")).await.unwrap();

    let recent = db.notes.list_recent(owner).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].title, "fresh");
}
