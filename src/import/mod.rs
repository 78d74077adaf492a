//! Bulk import of audio files from a directory.
//!
//! Files are copied into the upload store and cataloged with metadata guessed
//! from their names (see [`filename`]). A bad file is logged and counted; it
//! never stops the rest of the batch.

pub mod filename;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use homily_common::paths::{guess_mime_type, is_audio_file};
use homily_common::RecordId;
use homily_db::models::{MediaRecord, NewRecord};
use homily_db::pool::{get_conn, DbPool};
use homily_db::queries::records;
use walkdir::WalkDir;

use crate::ingest::{RemoveOnDrop, UploadStore};
use filename::parse_filename;

/// Totals for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
    /// Ids of the imported records, in name order.
    pub ids: Vec<RecordId>,
}

/// Audio files directly inside `dir`, sorted by file name.
pub fn find_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to read directory {:?}", dir))?;
        if entry.file_type().is_file() && is_audio_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Import every audio file found directly inside `dir`.
pub async fn import_directory(
    pool: &DbPool,
    store: &UploadStore,
    dir: &Path,
) -> Result<ImportSummary> {
    if !dir.is_dir() {
        anyhow::bail!("Import source {:?} is not a directory", dir);
    }

    store
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create upload directory {:?}", store.dir()))?;

    let files = find_audio_files(dir)?;
    tracing::info!("Found {} audio files in {:?}", files.len(), dir);

    let mut summary = ImportSummary::default();
    for path in files {
        match import_file(pool, store, &path).await {
            Ok(record) => {
                tracing::info!(
                    record_id = %record.id,
                    speaker = %record.speaker,
                    "Imported {}",
                    record.filename
                );
                summary.imported += 1;
                summary.ids.push(record.id);
            }
            Err(e) => {
                tracing::warn!("Failed to import {:?}: {}", path, e);
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        imported = summary.imported,
        failed = summary.failed,
        "Import finished"
    );
    Ok(summary)
}

/// Copy one file into the store and catalog it.
pub async fn import_file(
    pool: &DbPool,
    store: &UploadStore,
    src: &Path,
) -> homily_common::Result<MediaRecord> {
    let original_name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| homily_common::Error::invalid_input("path has no file name"))?;
    let base_name = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let meta = parse_filename(&base_name);
    let id = RecordId::new();
    let dest = store.path_for(id, &original_name);

    let new = NewRecord {
        title: meta.title,
        speaker: meta.speaker,
        date: meta.date,
        filename: original_name,
        storage_path: dest.to_string_lossy().into_owned(),
        mime_type: guess_mime_type(src).to_string(),
        size_bytes: 0,
    };
    // Reject bad metadata before copying anything.
    new.validate()?;

    let size_bytes = store.copy_file(src, &dest).await?;
    let stored = RemoveOnDrop::new(dest);
    let record = MediaRecord::new(id, NewRecord { size_bytes, ..new });

    let conn = get_conn(pool)?;
    records::insert_record(&conn, &record)?;
    stored.keep();

    Ok(record)
}
