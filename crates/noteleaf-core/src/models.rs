//! Core data models for noteleaf.
//!
//! These types are shared across all noteleaf crates and represent the
//! domain entities: users (identified by email only) and their notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Maximum title length in Unicode code points.
pub const MAX_TITLE_LEN: usize = 255;

/// Maximum email length in Unicode code points.
pub const MAX_EMAIL_LEN: usize = 255;

// =============================================================================
// USER TYPES
// =============================================================================

/// A registered user. Created on registration, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Stored in normalized (trimmed, lowercased) form.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Normalize an email address for storage and lookup.
///
/// Emails are matched case-insensitively, so the canonical form is the
/// trimmed, lowercased string. Returns `InvalidInput` for anything that
/// cannot plausibly be an email address.
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(Error::InvalidInput("email must not be empty".into()));
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(Error::InvalidInput(format!(
            "email must be at most {} characters",
            MAX_EMAIL_LEN
        )));
    }
    // Minimal shape check; email-only login means the address is an
    // identifier, not a credential, so full RFC validation buys nothing.
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(Error::InvalidInput(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(email)
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Lifecycle status of a note. Archiving is reversible and is not deletion;
/// deletion removes the record entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    Active,
    Archived,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NoteStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(Error::InvalidInput(format!(
                "status must be 'active' or 'archived', got '{}'",
                other
            ))),
        }
    }
}

/// A note owned by a single user.
///
/// `owner_id` is immutable after creation, and every repository operation
/// on a note is scoped to it. `tags` holds the parsed, normalized list;
/// the comma-joined form exists only at the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub status: NoteStatus,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validate a note title: non-empty after trimming, bounded length.
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::InvalidInput(format!(
            "title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}
