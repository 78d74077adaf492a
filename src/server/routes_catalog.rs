//! Catalog browsing routes.
//!
//! Listing, lookup by id and the speaker index. All reads go through
//! [`homily_db::queries::records`].

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use homily_common::{RecordId, SortOrder};
use homily_db::models::MediaRecord;
use homily_db::pool::get_conn;
use homily_db::queries::records::{self, RecordFilter};
use serde::{Deserialize, Serialize};

use super::{AppContext, AppError};

/// Create catalog routes.
pub fn catalog_routes() -> Router<AppContext> {
    Router::new()
        .route("/recordings", get(list_recordings))
        .route("/recordings/:id", get(get_recording))
        .route("/speakers", get(list_speakers))
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Query parameters for listing recordings.
#[derive(Debug, Default, Deserialize)]
pub struct ListRecordingsQuery {
    /// Case-insensitive substring of title or speaker
    pub q: Option<String>,
    /// Exact speaker name
    pub speaker: Option<String>,
    /// One of `date_desc`, `date_asc`, `title_asc`, `title_desc`
    pub sort: Option<String>,
}

impl ListRecordingsQuery {
    fn into_filter(self) -> RecordFilter {
        // Unrecognised sort values fall back to newest first.
        let sort = self
            .sort
            .as_deref()
            .and_then(|s| s.parse::<SortOrder>().ok())
            .unwrap_or_default();

        let mut filter = RecordFilter::new().sort(sort);
        if let Some(q) = self.q {
            filter = filter.search(q);
        }
        if let Some(speaker) = self.speaker {
            filter = filter.speaker(speaker);
        }
        filter
    }
}

/// A recording as exposed over the API. The storage path stays private.
#[derive(Debug, Serialize)]
pub struct RecordingResponse {
    pub id: String,
    pub title: String,
    pub speaker: String,
    pub date: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub duration_seconds: Option<i64>,
    pub created_at: String,
}

impl From<MediaRecord> for RecordingResponse {
    fn from(record: MediaRecord) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.title,
            speaker: record.speaker,
            date: record.date.to_string(),
            filename: record.filename,
            mime_type: record.mime_type,
            size_bytes: record.size_bytes,
            duration_seconds: record.duration_seconds,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordingListResponse {
    pub items: Vec<RecordingResponse>,
}

#[derive(Debug, Serialize)]
pub struct SpeakersResponse {
    pub speakers: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List recordings, filtered and sorted, at most 200 at a time.
pub async fn list_recordings(
    State(ctx): State<AppContext>,
    Query(query): Query<ListRecordingsQuery>,
) -> Result<Json<RecordingListResponse>, AppError> {
    let filter = query.into_filter();
    let conn = get_conn(&ctx.db_pool)?;
    let items = records::list_records(&conn, &filter)?;

    Ok(Json(RecordingListResponse {
        items: items.into_iter().map(RecordingResponse::from).collect(),
    }))
}

/// Get one recording by id.
pub async fn get_recording(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<RecordingResponse>, AppError> {
    let id: RecordId = id.parse().map_err(|_| AppError::not_found())?;
    let conn = get_conn(&ctx.db_pool)?;

    records::get_record(&conn, id)?
        .map(|record| Json(RecordingResponse::from(record)))
        .ok_or_else(AppError::not_found)
}

/// Distinct speaker names, sorted.
pub async fn list_speakers(
    State(ctx): State<AppContext>,
) -> Result<Json<SpeakersResponse>, AppError> {
    let conn = get_conn(&ctx.db_pool)?;
    let speakers = records::list_speakers(&conn)?;
    Ok(Json(SpeakersResponse { speakers }))
}
