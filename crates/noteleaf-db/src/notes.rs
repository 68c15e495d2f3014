//! Note repository implementation.
//!
//! Every statement is predicated on both the note id and the owner id, so
//! a single atomic statement performs lookup and authorization together:
//! zero matched rows means `NotFound` whether the note is absent or owned
//! by another user. Row-level atomicity of single-statement updates gives
//! per-note write serialization without cross-note transactions.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use noteleaf_core::{
    CreateNoteRequest, Error, ListNotesRequest, Note, NoteRepository, NoteStatus, Result,
    UpdateNoteRequest,
};

/// Window for the "recent notes" listing.
const RECENT_WINDOW_HOURS: i64 = 24;

const NOTE_COLUMNS: &str =
    "id, owner_id, title, content, tags, status, is_favorite, created_at, updated_at";

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn not_found(note_id: Uuid) -> Error {
        Error::NotFound(format!("note {} not found", note_id))
    }
}

fn map_row_to_note(row: sqlx::postgres::PgRow) -> Result<Note> {
    let status: String = row.get("status");
    let status: NoteStatus = status
        .parse()
        .map_err(|_| Error::Internal(format!("unexpected note status '{}'", status)))?;
    Ok(Note {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        content: row.get("content"),
        tags: row.get("tags"),
        status,
        is_favorite: row.get("is_favorite"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, owner_id: Uuid, req: CreateNoteRequest) -> Result<Note> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO notes (id, owner_id, title, content, tags, status, is_favorite, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, 'active', false, $6, $6)
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(&req.tags)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        map_row_to_note(row)
    }

    async fn fetch(&self, owner_id: Uuid, note_id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM notes WHERE id = $1 AND owner_id = $2",
            NOTE_COLUMNS
        ))
        .bind(note_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        row.map(map_row_to_note)
            .transpose()?
            .ok_or_else(|| Self::not_found(note_id))
    }

    async fn list(&self, owner_id: Uuid, req: ListNotesRequest) -> Result<Vec<Note>> {
        let mut query = format!("SELECT {} FROM notes WHERE owner_id = $1 ", NOTE_COLUMNS);
        let mut param_idx = 2;

        if req.status.is_some() {
            query.push_str(&format!("AND status = ${} ", param_idx));
            param_idx += 1;
        }
        if req.favorite.is_some() {
            query.push_str(&format!("AND is_favorite = ${} ", param_idx));
            param_idx += 1;
        }
        if req.tag.is_some() {
            query.push_str(&format!("AND ${} = ANY(tags) ", param_idx));
            param_idx += 1;
        }

        query.push_str("ORDER BY created_at DESC, id DESC ");

        if req.limit.is_some() {
            query.push_str(&format!("LIMIT ${} ", param_idx));
            param_idx += 1;
        }
        if req.offset.is_some() {
            query.push_str(&format!("OFFSET ${} ", param_idx));
        }

        let mut q = sqlx::query(&query).bind(owner_id);
        if let Some(status) = req.status {
            q = q.bind(status.as_str());
        }
        if let Some(favorite) = req.favorite {
            q = q.bind(favorite);
        }
        if let Some(tag) = &req.tag {
            q = q.bind(tag);
        }
        if let Some(limit) = req.limit {
            q = q.bind(limit);
        }
        if let Some(offset) = req.offset {
            q = q.bind(offset);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        rows.into_iter().map(map_row_to_note).collect()
    }

    async fn list_recent(&self, owner_id: Uuid) -> Result<Vec<Note>> {
        let cutoff = Utc::now() - Duration::hours(RECENT_WINDOW_HOURS);
        let rows = sqlx::query(&format!(
            "SELECT {} FROM notes
             WHERE owner_id = $1 AND (created_at >= $2 OR updated_at >= $2)
             ORDER BY created_at DESC, id DESC",
            NOTE_COLUMNS
        ))
        .bind(owner_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        rows.into_iter().map(map_row_to_note).collect()
    }

    async fn update(
        &self,
        owner_id: Uuid,
        note_id: Uuid,
        req: UpdateNoteRequest,
    ) -> Result<Note> {
        // $1 = now, $2 = id, $3 = owner; supplied fields start at $4.
        let mut updates: Vec<String> = vec!["updated_at = $1".to_string()];
        let mut param_idx = 4;

        if req.title.is_some() {
            updates.push(format!("title = ${}", param_idx));
            param_idx += 1;
        }
        if req.content.is_some() {
            updates.push(format!("content = ${}", param_idx));
            param_idx += 1;
        }
        if req.tags.is_some() {
            updates.push(format!("tags = ${}", param_idx));
        }

        let query = format!(
            "UPDATE notes SET {} WHERE id = $2 AND owner_id = $3 RETURNING {}",
            updates.join(", "),
            NOTE_COLUMNS
        );

        let mut q = sqlx::query(&query).bind(Utc::now()).bind(note_id).bind(owner_id);
        if let Some(title) = &req.title {
            q = q.bind(title);
        }
        if let Some(content) = &req.content {
            q = q.bind(content);
        }
        if let Some(tags) = &req.tags {
            q = q.bind(tags);
        }

        let row = q.fetch_optional(&self.pool).await.map_err(Error::Database)?;
        row.map(map_row_to_note)
            .transpose()?
            .ok_or_else(|| Self::not_found(note_id))
    }

    async fn set_status(
        &self,
        owner_id: Uuid,
        note_id: Uuid,
        status: NoteStatus,
    ) -> Result<Note> {
        // Setting the current status again is a valid call and still bumps
        // updated_at.
        let row = sqlx::query(&format!(
            "UPDATE notes SET status = $1, updated_at = $2
             WHERE id = $3 AND owner_id = $4
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(note_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        row.map(map_row_to_note)
            .transpose()?
            .ok_or_else(|| Self::not_found(note_id))
    }

    async fn set_favorite(
        &self,
        owner_id: Uuid,
        note_id: Uuid,
        is_favorite: bool,
    ) -> Result<Note> {
        let row = sqlx::query(&format!(
            "UPDATE notes SET is_favorite = $1, updated_at = $2
             WHERE id = $3 AND owner_id = $4
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(is_favorite)
        .bind(Utc::now())
        .bind(note_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        row.map(map_row_to_note)
            .transpose()?
            .ok_or_else(|| Self::not_found(note_id))
    }

    async fn delete(&self, owner_id: Uuid, note_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND owner_id = $2")
            .bind(note_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Self::not_found(note_id));
        }
        Ok(())
    }
}
