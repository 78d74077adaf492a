//! Direct streaming with HTTP range requests.
//!
//! [`open_stream`] resolves a record, opens its file and decides between a
//! full, partial or unsatisfiable response. The axum handler only maps that
//! outcome onto status codes and headers.
//!
//! The body is a [`ByteSource`] that owns the open file. Hyper drops the body
//! when the client disconnects or the transfer fails, which closes the
//! descriptor; nothing else holds on to it.

use std::io::{ErrorKind, SeekFrom};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use homily_common::{Error, RecordId, Result};
use homily_db::pool::{get_conn, DbPool};
use homily_db::queries::records;
use serde_json::json;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;

use super::range::{parse_range_header, unsatisfied_content_range, ByteRange};
use crate::server::{AppContext, AppError};

/// Read size for each chunk forwarded to the client.
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Incremental reader over exactly the bytes being served.
pub type ByteSource = ReaderStream<Take<File>>;

/// Headers shared by full and partial responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeaders {
    pub mime_type: String,
    /// Size of the file on disk when it was opened.
    pub total_size: u64,
    /// Present only on partial responses.
    pub content_range: Option<ByteRange>,
    /// Number of bytes the body will yield.
    pub content_length: u64,
}

/// Result of asking to stream a record.
#[derive(Debug)]
pub enum StreamOutcome {
    /// No range requested; the whole file follows.
    Full {
        headers: StreamHeaders,
        body: ByteSource,
    },
    /// A satisfiable range was requested; only that span follows.
    Partial {
        headers: StreamHeaders,
        body: ByteSource,
    },
    /// The range was malformed or outside the file.
    NotSatisfiable { total_size: u64 },
    /// No record with this id.
    NotFound,
    /// The record exists but its file does not.
    FileMissing { storage_path: String },
}

/// Coarse status of a [`StreamOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Full,
    Partial,
    NotSatisfiable,
    NotFound,
    FileMissing,
}

impl StreamOutcome {
    pub fn status(&self) -> StreamStatus {
        match self {
            Self::Full { .. } => StreamStatus::Full,
            Self::Partial { .. } => StreamStatus::Partial,
            Self::NotSatisfiable { .. } => StreamStatus::NotSatisfiable,
            Self::NotFound => StreamStatus::NotFound,
            Self::FileMissing { .. } => StreamStatus::FileMissing,
        }
    }

    /// Headers of a full or partial response.
    pub fn headers(&self) -> Option<&StreamHeaders> {
        match self {
            Self::Full { headers, .. } | Self::Partial { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// Take the body of a full or partial response.
    pub fn into_body(self) -> Option<ByteSource> {
        match self {
            Self::Full { body, .. } | Self::Partial { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Open a record's file for streaming, honoring an optional `Range` header.
///
/// Expected conditions (unknown id, missing file, bad range) come back as
/// [`StreamOutcome`] variants. Only catalog failures and unexpected I/O
/// errors are returned as `Err`.
pub async fn open_stream(
    pool: &DbPool,
    id: RecordId,
    range: Option<&str>,
) -> Result<StreamOutcome> {
    let record = {
        let conn = get_conn(pool)?;
        records::get_record(&conn, id)?
    };

    let Some(record) = record else {
        return Ok(StreamOutcome::NotFound);
    };

    let file_missing = || {
        tracing::warn!(
            record_id = %id,
            path = %record.storage_path,
            "Catalog record has no file in storage"
        );
        StreamOutcome::FileMissing {
            storage_path: record.storage_path.clone(),
        }
    };

    let mut file = match File::open(&record.storage_path).await {
        Ok(file) => file,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            return Ok(file_missing());
        }
        Err(e) => return Err(Error::Io(e)),
    };

    // Size of the handle we actually read from, not the catalog's copy.
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Ok(file_missing());
    }
    let total_size = metadata.len();

    if total_size != record.size_bytes {
        tracing::debug!(
            record_id = %id,
            catalog_size = record.size_bytes,
            actual_size = total_size,
            "Stored file size differs from catalog"
        );
    }

    let Some(range_header) = range else {
        return Ok(StreamOutcome::Full {
            headers: StreamHeaders {
                mime_type: record.mime_type,
                total_size,
                content_range: None,
                content_length: total_size,
            },
            body: ReaderStream::with_capacity(file.take(total_size), STREAM_CHUNK_SIZE),
        });
    };

    let span = match parse_range_header(range_header, total_size) {
        Ok(span) => span,
        Err(e) => {
            tracing::debug!(record_id = %id, "Unsatisfiable range: {}", e);
            return Ok(StreamOutcome::NotSatisfiable { total_size });
        }
    };

    file.seek(SeekFrom::Start(span.start)).await?;
    let length = span.length();

    Ok(StreamOutcome::Partial {
        headers: StreamHeaders {
            mime_type: record.mime_type,
            total_size,
            content_range: Some(span),
            content_length: length,
        },
        body: ReaderStream::with_capacity(file.take(length), STREAM_CHUNK_SIZE),
    })
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl StreamOutcome {
    /// Map the outcome onto an HTTP response.
    pub fn into_http_response(self) -> std::result::Result<Response, StatusCode> {
        match self {
            Self::Full { headers, body } => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, headers.mime_type)
                .header(header::CONTENT_LENGTH, headers.content_length.to_string())
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CACHE_CONTROL, "max-age=31536000")
                .body(Body::from_stream(body))
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR),
            Self::Partial { headers, body } => {
                let content_range = headers
                    .content_range
                    .map(|span| span.content_range(headers.total_size))
                    .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

                Response::builder()
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(header::CONTENT_TYPE, headers.mime_type)
                    .header(header::CONTENT_LENGTH, headers.content_length.to_string())
                    .header(header::CONTENT_RANGE, content_range)
                    .header(header::ACCEPT_RANGES, "bytes")
                    .header(header::CACHE_CONTROL, "max-age=31536000")
                    .body(Body::from_stream(body))
                    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::NotSatisfiable { total_size } => Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, unsatisfied_content_range(total_size))
                .header(header::ACCEPT_RANGES, "bytes")
                .body(Body::empty())
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR),
            Self::NotFound => Ok(error_body(StatusCode::NOT_FOUND, "Not found")),
            Self::FileMissing { .. } => Ok(error_body(StatusCode::NOT_FOUND, "File missing")),
        }
    }
}

/// Serve a recording with range request support.
pub async fn stream_recording(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> std::result::Result<Response, AppError> {
    // Ids are opaque; one that does not parse names no record.
    let Ok(id) = id.parse::<RecordId>() else {
        return Ok(error_body(StatusCode::NOT_FOUND, "Not found"));
    };

    // A header that is not valid text cannot be a byte range.
    let range = headers
        .get(header::RANGE)
        .map(|value| value.to_str().unwrap_or_default());

    let outcome = open_stream(&ctx.db_pool, id, range).await?;
    outcome
        .into_http_response()
        .map_err(|status| AppError::new(status, "Failed to build stream response"))
}
