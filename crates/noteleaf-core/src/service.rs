//! Domain services: identity resolution and owner-scoped note operations.
//!
//! Handlers never talk to a repository directly; they go through these
//! services, which validate input and delegate to the owner-scoped
//! repository contract. That keeps the access rule in one place: there is
//! no note operation that skips the ownership check.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{normalize_email, validate_title, Note, NoteStatus, User};
use crate::tags::normalize_tags;
use crate::traits::{
    CreateNoteRequest, ListNotesRequest, NoteRepository, UpdateNoteRequest, UserRepository,
};

/// Maps email addresses to stable user identities.
///
/// Email-only auth: the address is an identifier, not a credential. This is
/// an explicit simplification of the auth model, not a security boundary.
#[derive(Debug, Clone)]
pub struct IdentityService<U> {
    users: U,
}

impl<U: UserRepository> IdentityService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// Register a new user. Fails with `Conflict` for a known email.
    pub async fn register(&self, email: &str) -> Result<User> {
        let email = normalize_email(email)?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(Error::Conflict(format!(
                "email '{}' is already registered",
                email
            )));
        }
        // A concurrent register can still slip past the check above; the
        // unique index surfaces it as Conflict from the repository.
        let user = self.users.insert(&email).await?;
        tracing::info!(user_id = %user.id, "registered user");
        Ok(user)
    }

    /// Log an existing user in. Fails with `NotFound` for unknown emails.
    pub async fn login(&self, email: &str) -> Result<User> {
        let email = normalize_email(email)?;
        self.users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| Error::NotFound(format!("no account for '{}'", email)))
    }

    /// Resolve a user id, failing with `NotFound` for unknown ids.
    pub async fn require_user(&self, id: Uuid) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {} not found", id)))
    }
}

/// Owner-scoped note operations.
#[derive(Debug, Clone)]
pub struct NoteService<N> {
    notes: N,
}

impl<N: NoteRepository> NoteService<N> {
    pub fn new(notes: N) -> Self {
        Self { notes }
    }

    /// Create a note. The title is required and length-bounded; tags are
    /// normalized (trimmed, de-duplicated, empties dropped).
    pub async fn create(&self, owner_id: Uuid, mut req: CreateNoteRequest) -> Result<Note> {
        validate_title(&req.title)?;
        req.tags = normalize_tags(&req.tags);
        let note = self.notes.insert(owner_id, req).await?;
        tracing::debug!(note_id = %note.id, owner_id = %owner_id, "created note");
        Ok(note)
    }

    pub async fn get(&self, owner_id: Uuid, note_id: Uuid) -> Result<Note> {
        self.notes.fetch(owner_id, note_id).await
    }

    pub async fn list(&self, owner_id: Uuid, req: ListNotesRequest) -> Result<Vec<Note>> {
        if let Some(limit) = req.limit {
            if limit < 1 {
                return Err(Error::InvalidInput("limit must be >= 1".into()));
            }
        }
        if let Some(offset) = req.offset {
            if offset < 0 {
                return Err(Error::InvalidInput("offset must be >= 0".into()));
            }
        }
        self.notes.list(owner_id, req).await
    }

    /// Notes created or updated within the last 24 hours.
    pub async fn recent(&self, owner_id: Uuid) -> Result<Vec<Note>> {
        self.notes.list_recent(owner_id).await
    }

    /// Partial update. Supplied fields are validated and applied; omitted
    /// fields are untouched. Always bumps `updated_at`.
    pub async fn update(
        &self,
        owner_id: Uuid,
        note_id: Uuid,
        mut req: UpdateNoteRequest,
    ) -> Result<Note> {
        if let Some(title) = &req.title {
            validate_title(title)?;
        }
        if let Some(tags) = req.tags.take() {
            req.tags = Some(normalize_tags(&tags));
        }
        self.notes.update(owner_id, note_id, req).await
    }

    pub async fn set_status(
        &self,
        owner_id: Uuid,
        note_id: Uuid,
        status: NoteStatus,
    ) -> Result<Note> {
        self.notes.set_status(owner_id, note_id, status).await
    }

    pub async fn set_favorite(
        &self,
        owner_id: Uuid,
        note_id: Uuid,
        is_favorite: bool,
    ) -> Result<Note> {
        self.notes.set_favorite(owner_id, note_id, is_favorite).await
    }

    pub async fn delete(&self, owner_id: Uuid, note_id: Uuid) -> Result<()> {
        self.notes.delete(owner_id, note_id).await?;
        tracing::debug!(note_id = %note_id, owner_id = %owner_id, "deleted note");
        Ok(())
    }
}
