//! Upload intake.
//!
//! `POST /admin/upload` takes a multipart form with `title`, `speaker`,
//! `date` and an audio `file`. The file is streamed into the upload store and
//! made durable before the catalog record is inserted. Until the insert
//! succeeds the stored file is held by a [`RemoveOnDrop`] guard, so a
//! rejected or abandoned upload leaves nothing behind.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use homily_common::RecordId;
use homily_db::models::{is_audio_mime, parse_record_date, MediaRecord, NewRecord};
use homily_db::pool::get_conn;
use homily_db::queries::records;
use serde::Serialize;

use super::{AppContext, AppError};
use crate::ingest::{IngestError, RemoveOnDrop};

/// Room for the text fields and multipart framing on top of the file itself.
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Create upload routes.
pub fn upload_routes(max_upload_bytes: u64) -> Router<AppContext> {
    let body_limit = usize::try_from(max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/admin/upload", post(upload_recording))
        .layer(DefaultBodyLimit::max(body_limit))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub id: String,
}

/// Text fields collected from the form, in whatever order they arrive.
#[derive(Debug, Default)]
struct UploadForm {
    title: Option<String>,
    speaker: Option<String>,
    date: Option<String>,
}

/// The stored file, once the `file` part has been consumed.
#[derive(Debug)]
struct StoredFile {
    filename: String,
    mime_type: String,
    file: RemoveOnDrop,
    size_bytes: u64,
}

impl UploadForm {
    fn into_new_record(self, file: &StoredFile) -> Result<NewRecord, AppError> {
        let title = self.title.unwrap_or_default().trim().to_string();
        let speaker = self.speaker.unwrap_or_default().trim().to_string();
        if title.is_empty() || speaker.is_empty() {
            return Err(AppError::bad_request("Missing fields"));
        }

        let date = parse_record_date(self.date.as_deref().unwrap_or_default().trim())?;

        Ok(NewRecord {
            title,
            speaker,
            date,
            filename: file.filename.clone(),
            storage_path: file.file.path().to_string_lossy().into_owned(),
            mime_type: file.mime_type.clone(),
            size_bytes: file.size_bytes,
        })
    }
}

/// Accept a new recording.
pub async fn upload_recording(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let id = RecordId::new();
    let mut form = UploadForm::default();
    let mut stored: Option<StoredFile> = None;

    let outcome = read_form(&ctx, id, &mut multipart, &mut form, &mut stored).await;

    let result = match outcome {
        Ok(()) => match stored.as_ref() {
            Some(file) => form
                .into_new_record(file)
                .and_then(|new| insert(&ctx, id, new)),
            None => Err(AppError::bad_request("Missing file")),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        if stored.is_some() {
            tracing::debug!(record_id = %id, "Upload rejected after storing file: {}", e.message());
        }
        return Err(e);
    }
    if let Some(file) = stored {
        file.file.keep();
    }

    tracing::info!(record_id = %id, "Recording uploaded");
    Ok(Json(UploadResponse {
        ok: true,
        id: id.to_string(),
    }))
}

async fn read_form(
    ctx: &AppContext,
    id: RecordId,
    multipart: &mut Multipart,
    form: &mut UploadForm,
    stored: &mut Option<StoredFile>,
) -> Result<(), AppError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(()),
            Err(e) => return Err(AppError::new(e.status(), e.body_text())),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if stored.is_some() {
                    return Err(AppError::bad_request("Only one file may be uploaded"));
                }

                let mime_type = field.content_type().unwrap_or_default().to_string();
                if !is_audio_mime(&mime_type) {
                    return Err(AppError::bad_request("Only audio files allowed"));
                }

                let filename = field
                    .file_name()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or("upload")
                    .to_string();
                let path = ctx.uploads.path_for(id, &filename);
                let file = RemoveOnDrop::new(path.clone());

                let size_bytes = ctx
                    .uploads
                    .write_stream(&path, field)
                    .await
                    .map_err(|e| match e {
                        IngestError::TooLarge { limit } => AppError::payload_too_large(limit),
                        IngestError::Body(msg) => AppError::bad_request(msg),
                        IngestError::Io(e) => homily_common::Error::Io(e).into(),
                    })?;

                *stored = Some(StoredFile {
                    filename,
                    mime_type,
                    file,
                    size_bytes,
                });
            }
            "title" | "speaker" | "date" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::new(e.status(), e.body_text()))?;
                match name.as_str() {
                    "title" => form.title = Some(value),
                    "speaker" => form.speaker = Some(value),
                    _ => form.date = Some(value),
                }
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown upload field");
            }
        }
    }
}

fn insert(ctx: &AppContext, id: RecordId, new: NewRecord) -> Result<(), AppError> {
    let record = MediaRecord::new(id, new);
    let conn = get_conn(&ctx.db_pool)?;
    records::insert_record(&conn, &record)?;
    Ok(())
}
