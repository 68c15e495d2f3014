//! # noteleaf-core
//!
//! Core types, traits, and domain services for noteleaf, a personal
//! note-taking service with email-only identities.
//!
//! This crate provides the foundational data structures, the repository
//! trait contracts, and the domain rules (ownership scoping, note status
//! lifecycle, tag normalization) that other noteleaf crates depend on.

pub mod error;
pub mod models;
pub mod service;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{
    normalize_email, validate_title, Note, NoteStatus, User, MAX_EMAIL_LEN, MAX_TITLE_LEN,
};
pub use service::{IdentityService, NoteService};
pub use tags::{join_tags, normalize_tags, parse_tags};
pub use traits::{
    CreateNoteRequest, ListNotesRequest, NoteRepository, UpdateNoteRequest, UserRepository,
};
