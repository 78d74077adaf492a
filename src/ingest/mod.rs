//! Durable storage for uploaded and imported audio files.
//!
//! Every file is written to `<name>.part` first, synced to disk, then renamed
//! into place. A catalog record may only be created once one of the store's
//! write methods has returned.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use homily_common::RecordId;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// Upper bound on the sanitised part of a stored file name.
const MAX_SAFE_NAME_LEN: usize = 150;

/// Errors from writing a file into the store.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("upload stream failed: {0}")]
    Body(String),

    #[error("storage error: {0}")]
    Io(#[from] io::Error),
}

impl From<IngestError> for homily_common::Error {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::TooLarge { .. } | IngestError::Body(_) => Self::validation(e.to_string()),
            IngestError::Io(e) => Self::Io(e),
        }
    }
}

/// Replace every run of characters outside `[A-Za-z0-9_.-]` with one `_`.
///
/// The result is never empty and never contains a path separator.
pub fn safe_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
        if out.len() >= MAX_SAFE_NAME_LEN {
            break;
        }
    }

    if out.is_empty() {
        out.push_str("upload");
    }
    out
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Deletes a file when dropped, unless [`RemoveOnDrop::keep`] was called.
///
/// Covers every way a write can end early, including a handler future being
/// dropped because the client went away.
#[derive(Debug)]
pub struct RemoveOnDrop {
    path: PathBuf,
    armed: bool,
}

impl RemoveOnDrop {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm the guard and hand back the path.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed orphaned file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                "Failed to remove orphaned file: {}",
                e
            ),
        }
    }
}

/// The directory that owns recording files.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if needed.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Final location for a record's file. The id prefix keeps paths unique.
    pub fn path_for(&self, id: RecordId, original_name: &str) -> PathBuf {
        self.dir
            .join(format!("{}-{}", id, safe_file_name(original_name)))
    }

    /// Stream chunks to `dest`, enforcing the size limit.
    ///
    /// Returns the stored size. On any error nothing is left at `dest` or at
    /// its `.part` path.
    pub async fn write_stream<S, E>(&self, dest: &Path, stream: S) -> Result<u64, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let part = RemoveOnDrop::new(part_path(dest));
        let size = self.write_part(part.path(), dest, stream).await?;
        part.keep();
        Ok(size)
    }

    async fn write_part<S, E>(&self, part: &Path, dest: &Path, stream: S) -> Result<u64, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        futures::pin_mut!(stream);
        let mut file = File::create(part).await?;
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| IngestError::Body(e.to_string()))?;
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(IngestError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(part, dest).await?;
        let size = fs::metadata(dest).await?.len();

        tracing::debug!(path = %dest.display(), bytes = size, "Stored file");
        Ok(size)
    }

    /// Copy an existing file into the store at `dest`.
    pub async fn copy_file(&self, src: &Path, dest: &Path) -> Result<u64, IngestError> {
        let part = RemoveOnDrop::new(part_path(dest));
        let size = self.copy_part(src, part.path(), dest).await?;
        part.keep();
        Ok(size)
    }

    async fn copy_part(&self, src: &Path, part: &Path, dest: &Path) -> Result<u64, IngestError> {
        let len = fs::metadata(src).await?.len();
        if len > self.max_bytes {
            return Err(IngestError::TooLarge {
                limit: self.max_bytes,
            });
        }

        fs::copy(src, part).await?;
        File::open(part).await?.sync_all().await?;
        fs::rename(part, dest).await?;

        Ok(fs::metadata(dest).await?.len())
    }

}
