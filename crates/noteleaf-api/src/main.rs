//! noteleaf-api - HTTP API server for noteleaf.
//!
//! Exposes the identity and note domain services over HTTP. Every note
//! route carries a `user_id` query parameter; the domain layer scopes all
//! note access to that owner.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use noteleaf_core::{
    join_tags, normalize_tags, parse_tags, CreateNoteRequest, Error, IdentityService,
    ListNotesRequest, Note, NoteService, NoteStatus, UpdateNoteRequest, User,
};
use noteleaf_db::{Database, PgNoteRepository, PgUserRepository};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Global rate limiter type (direct quota, no keyed bucketing for a
/// personal server).
type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    identity: IdentityService<PgUserRepository>,
    notes: NoteService<PgNoteRepository>,
    /// Global rate limiter (None if rate limiting is disabled).
    rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

/// Build the global rate limiter from its quota settings. Zero values are
/// configuration errors, not panics; disable limiting with
/// RATE_LIMIT_ENABLED=false instead.
fn build_rate_limiter(requests: u32, period_secs: u64) -> anyhow::Result<Arc<GlobalRateLimiter>> {
    let burst = NonZeroU32::new(requests).context("RATE_LIMIT_REQUESTS must be at least 1")?;
    let quota = Quota::with_period(std::time::Duration::from_secs(period_secs))
        .context("RATE_LIMIT_PERIOD_SECS must be at least 1")?
        .allow_burst(burst);
    Ok(Arc::new(RateLimiter::direct(quota)))
}

/// Parse the ALLOWED_ORIGINS env var into CORS origin values.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - standard env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "noteleaf_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("noteleaf-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/noteleaf".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    // Rate limiting configuration
    let rate_limit_requests: u32 = std::env::var("RATE_LIMIT_REQUESTS")
        .unwrap_or_else(|_| "100".to_string())
        .parse()
        .unwrap_or(100);
    let rate_limit_period_secs: u64 = std::env::var("RATE_LIMIT_PERIOD_SECS")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .unwrap_or(60);
    let rate_limit_enabled: bool = std::env::var("RATE_LIMIT_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    // Connect to database and run pending migrations
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database ready");

    // Create rate limiter if enabled
    let rate_limiter = if rate_limit_enabled {
        Some(build_rate_limiter(rate_limit_requests, rate_limit_period_secs)?)
    } else {
        None
    };

    let state = AppState {
        identity: IdentityService::new(db.users.clone()),
        notes: NoteService::new(db.notes.clone()),
        rate_limiter,
    };

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Identity
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        // Notes CRUD and filtering
        .route("/api/v1/notes", get(list_notes).post(create_note))
        .route("/api/v1/notes/recent", get(recent_notes))
        .route(
            "/api/v1/notes/:id",
            get(get_note).patch(update_note).delete(delete_note),
        )
        .route("/api/v1/notes/:id/status", patch(update_note_status))
        .route("/api/v1/notes/:id/favorite", patch(update_note_favorite))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600))
        })
        .layer(RequestBodyLimitLayer::new(1024 * 1024)) // 1 MiB
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Global rate limiting middleware.
async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!("Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

enum ApiError {
    Internal(Error),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// IDENTITY HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
struct EmailBody {
    email: String,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    id: Uuid,
    email: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.identity.register(&body.email).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.identity.login(&body.email).await?;
    Ok(Json(UserResponse::from(user)))
}

// =============================================================================
// NOTE TRANSPORT TYPES
// =============================================================================

/// Wire representation of a note. Tags travel as a single comma-joined
/// string for compatibility with existing clients; timestamps are ISO-8601.
#[derive(Debug, Serialize)]
struct NoteResponse {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    tags: String,
    status: NoteStatus,
    is_favorite: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            user_id: note.owner_id,
            title: note.title,
            content: note.content,
            tags: join_tags(&note.tags),
            status: note.status,
            is_favorite: note.is_favorite,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Tags accepted either as the legacy comma-joined string or as a JSON
/// array; both normalize through the same parsing path.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagsField {
    Joined(String),
    List(Vec<String>),
}

impl TagsField {
    fn into_tags(self) -> Vec<String> {
        match self {
            TagsField::Joined(raw) => parse_tags(&raw),
            TagsField::List(list) => normalize_tags(&list),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct ListNotesQuery {
    user_id: Uuid,
    /// Filter by status: "active" or "archived".
    status: Option<String>,
    /// Filter by favorite flag.
    favorite: Option<bool>,
    /// Filter by exact tag match.
    tag: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CreateNoteBody {
    title: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tags: Option<TagsField>,
}

#[derive(Debug, Deserialize)]
struct UpdateNoteBody {
    title: Option<String>,
    content: Option<String>,
    tags: Option<TagsField>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

#[derive(Debug, Deserialize)]
struct FavoriteBody {
    is_favorite: bool,
}

// =============================================================================
// NOTE HANDLERS
// =============================================================================

async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<ListNotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.identity.require_user(query.user_id).await?;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<NoteStatus>)
        .transpose()?;

    let req = ListNotesRequest {
        status,
        favorite: query.favorite,
        tag: query.tag,
        limit: query.limit,
        offset: query.offset,
    };

    let notes = state.notes.list(query.user_id, req).await?;
    let notes: Vec<NoteResponse> = notes.into_iter().map(NoteResponse::from).collect();
    Ok(Json(notes))
}

async fn recent_notes(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.identity.require_user(query.user_id).await?;
    let notes = state.notes.recent(query.user_id).await?;
    let notes: Vec<NoteResponse> = notes.into_iter().map(NoteResponse::from).collect();
    Ok(Json(notes))
}

async fn create_note(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
    Json(body): Json<CreateNoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.identity.require_user(query.user_id).await?;

    let req = CreateNoteRequest {
        title: body.title,
        content: body.content.unwrap_or_default(),
        tags: body.tags.map(TagsField::into_tags).unwrap_or_default(),
    };

    let note = state.notes.create(query.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}

async fn get_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.notes.get(query.user_id, note_id).await?;
    Ok(Json(NoteResponse::from(note)))
}

async fn update_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
    Json(body): Json<UpdateNoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let req = UpdateNoteRequest {
        title: body.title,
        content: body.content,
        tags: body.tags.map(TagsField::into_tags),
    };

    let note = state.notes.update(query.user_id, note_id, req).await?;
    Ok(Json(NoteResponse::from(note)))
}

async fn update_note_status(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
    Json(body): Json<StatusBody>,
) -> Result<impl IntoResponse, ApiError> {
    let status: NoteStatus = body.status.parse()?;
    let note = state.notes.set_status(query.user_id, note_id, status).await?;
    Ok(Json(NoteResponse::from(note)))
}

async fn update_note_favorite(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
    Json(body): Json<FavoriteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .set_favorite(query.user_id, note_id, body.is_favorite)
        .await?;
    Ok(Json(NoteResponse::from(note)))
}

async fn delete_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.notes.delete(query.user_id, note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
