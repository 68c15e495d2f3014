//! Repository traits for noteleaf abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.
//!
//! Every note operation takes the requesting user's id and is scoped to it
//! at the storage layer: a single statement both looks up and authorizes,
//! so "note absent" and "note owned by someone else" are indistinguishable
//! (`Error::NotFound` for both) and no caller can bypass the check.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Note, NoteStatus, User};

/// Request for creating a new note. The note starts `active` and
/// not-favorite, with both timestamps set to now.
#[derive(Debug, Clone, Default)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Partial update of a note. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Filter for listing a user's notes. All supplied predicates must match.
#[derive(Debug, Clone, Default)]
pub struct ListNotesRequest {
    /// Restrict to notes with this status.
    pub status: Option<NoteStatus>,
    /// Restrict to (non-)favorites.
    pub favorite: Option<bool>,
    /// Exact, case-sensitive match against any of a note's tags.
    pub tag: Option<String>,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Pagination offset.
    pub offset: Option<i64>,
}

/// Repository for user identities.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user for an already-normalized email.
    ///
    /// Returns `Conflict` if the email is taken (races between check and
    /// insert surface through the storage layer's uniqueness guarantee).
    async fn insert(&self, email: &str) -> Result<User>;

    /// Look up a user by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Look up a user by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

/// Repository for note CRUD, status transitions, and filtered listing.
///
/// Implementations must serialize concurrent writes to a single note (e.g.
/// via the database's row-level atomicity) and must bump `updated_at` on
/// every mutation, including sets to an unchanged status/favorite value.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note owned by `owner_id`.
    async fn insert(&self, owner_id: Uuid, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch a note by id, scoped to its owner.
    async fn fetch(&self, owner_id: Uuid, note_id: Uuid) -> Result<Note>;

    /// List the owner's notes matching the filter, ordered by
    /// `created_at` descending with ties broken by id descending.
    async fn list(&self, owner_id: Uuid, req: ListNotesRequest) -> Result<Vec<Note>>;

    /// List the owner's notes created or updated within the last 24 hours.
    async fn list_recent(&self, owner_id: Uuid) -> Result<Vec<Note>>;

    /// Apply a partial update and return the new note state.
    async fn update(&self, owner_id: Uuid, note_id: Uuid, req: UpdateNoteRequest) -> Result<Note>;

    /// Set the status. Idempotent in value; always bumps `updated_at`.
    async fn set_status(&self, owner_id: Uuid, note_id: Uuid, status: NoteStatus) -> Result<Note>;

    /// Set the favorite flag. Idempotent in value; always bumps `updated_at`.
    async fn set_favorite(
        &self,
        owner_id: Uuid,
        note_id: Uuid,
        is_favorite: bool,
    ) -> Result<Note>;

    /// Permanently delete a note. There is no trash state.
    async fn delete(&self, owner_id: Uuid, note_id: Uuid) -> Result<()>;
}
