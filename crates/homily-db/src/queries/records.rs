//! Catalog record queries.
//!
//! Inserts, lookups, and the filtered/sorted listing. Listings are built by
//! [`RecordQuery`] from a [`RecordFilter`]; every user-supplied value is bound
//! as a named parameter, never spliced into SQL text.

use chrono::{DateTime, NaiveDate, Utc};
use homily_common::{Error, RecordId, Result, SortOrder};
use rusqlite::{named_params, Connection, ErrorCode, Row, ToSql};
use uuid::Uuid;

use crate::models::{MediaRecord, NewRecord, DATE_FORMAT};

/// Hard ceiling on the number of rows a listing returns.
pub const MAX_LIST_RESULTS: u32 = 200;

const RECORD_COLUMNS: &str = "id, title, speaker, date, filename, storage_path, mime_type, \
                              size_bytes, duration_seconds, created_at";

/// Filter options for listing records.
///
/// Blank strings are treated the same as absent filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Case-insensitive substring of title or speaker.
    pub search: Option<String>,
    /// Exact speaker name.
    pub speaker: Option<String>,
    /// Result order; ties always fall back to insertion order.
    pub sort: SortOrder,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    fn search_term(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    fn speaker_term(&self) -> Option<&str> {
        non_blank(self.speaker.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Escape `LIKE` wildcards so the pattern matches the text literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A listing query compiled from a [`RecordFilter`].
///
/// Clauses are emitted in a fixed order: search first, then speaker, joined
/// with `AND`. Ordering always ends with `rowid ASC` so equal keys keep their
/// insertion order, and the row cap is [`MAX_LIST_RESULTS`].
#[derive(Debug, Clone)]
pub struct RecordQuery {
    sql: String,
    search_pattern: Option<String>,
    speaker: Option<String>,
    limit: u32,
}

impl RecordQuery {
    pub fn build(filter: &RecordFilter) -> Self {
        let mut sql = format!("SELECT {} FROM recordings", RECORD_COLUMNS);

        let search_pattern = filter
            .search_term()
            .map(|term| format!("%{}%", escape_like(term)));
        let speaker = filter.speaker_term().map(str::to_string);

        let mut clauses = Vec::new();
        if search_pattern.is_some() {
            clauses.push(r"(title LIKE :search ESCAPE '\' OR speaker LIKE :search ESCAPE '\')");
        }
        if speaker.is_some() {
            clauses.push("speaker = :speaker");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(match filter.sort {
            SortOrder::DateDesc => "date DESC",
            SortOrder::DateAsc => "date ASC",
            SortOrder::TitleAsc => "title ASC",
            SortOrder::TitleDesc => "title DESC",
        });
        sql.push_str(", rowid ASC LIMIT :limit");

        Self {
            sql,
            search_pattern,
            speaker,
            limit: MAX_LIST_RESULTS,
        }
    }

    /// The generated SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn params(&self) -> Vec<(&str, &dyn ToSql)> {
        let mut params: Vec<(&str, &dyn ToSql)> = vec![(":limit", &self.limit)];
        if let Some(ref pattern) = self.search_pattern {
            params.push((":search", pattern));
        }
        if let Some(ref speaker) = self.speaker {
            params.push((":speaker", speaker));
        }
        params
    }
}

fn conversion_error(col: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_record_row(row: &Row<'_>) -> rusqlite::Result<MediaRecord> {
    let id: String = row.get(0)?;
    let date: String = row.get(3)?;
    let size_bytes: i64 = row.get(7)?;
    let created_at: String = row.get(9)?;

    Ok(MediaRecord {
        id: RecordId::from(Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?),
        title: row.get(1)?,
        speaker: row.get(2)?,
        date: NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| conversion_error(3, e))?,
        filename: row.get(4)?,
        storage_path: row.get(5)?,
        mime_type: row.get(6)?,
        size_bytes: u64::try_from(size_bytes).map_err(|e| conversion_error(7, e))?,
        duration_seconds: row.get(8)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(9, e))?,
    })
}

fn map_insert_error(e: rusqlite::Error, record: &MediaRecord) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(ref err, ref msg)
            if err.code == ErrorCode::ConstraintViolation =>
        {
            let detail = msg.as_deref().unwrap_or_default();
            if detail.contains("storage_path") {
                Error::conflict(format!(
                    "storage path '{}' already belongs to another record",
                    record.storage_path
                ))
            } else if detail.contains("recordings.id") {
                Error::conflict(format!("record {} already exists", record.id))
            } else {
                Error::validation(detail.to_string())
            }
        }
        other => Error::database(other.to_string()),
    }
}

/// Insert a fully-formed record.
///
/// A single `INSERT` statement: concurrent readers see the catalog either
/// with or without the row, never half of it.
///
/// # Errors
///
/// * `Error::InvalidInput` - required fields empty or malformed
/// * `Error::Conflict` - the id, or the storage path, is already taken
/// * `Error::Database` - the store failed
pub fn insert_record(conn: &Connection, record: &MediaRecord) -> Result<()> {
    record.validate()?;

    let size_bytes = i64::try_from(record.size_bytes)
        .map_err(|_| Error::validation("size_bytes is too large"))?;

    conn.execute(
        "INSERT INTO recordings (id, title, speaker, date, filename, storage_path, mime_type,
                                 size_bytes, duration_seconds, created_at)
         VALUES (:id, :title, :speaker, :date, :filename, :storage_path, :mime_type,
                 :size_bytes, :duration_seconds, :created_at)",
        named_params! {
            ":id": record.id.to_string(),
            ":title": record.title,
            ":speaker": record.speaker,
            ":date": record.date.format(DATE_FORMAT).to_string(),
            ":filename": record.filename,
            ":storage_path": record.storage_path,
            ":mime_type": record.mime_type,
            ":size_bytes": size_bytes,
            ":duration_seconds": record.duration_seconds,
            ":created_at": record.created_at.to_rfc3339(),
        },
    )
    .map_err(|e| map_insert_error(e, record))?;

    Ok(())
}

/// Create a record with a freshly generated id.
pub fn create_record(conn: &Connection, new: &NewRecord) -> Result<MediaRecord> {
    new.validate()?;
    let record = MediaRecord::new(RecordId::new(), new.clone());
    insert_record(conn, &record)?;
    Ok(record)
}

/// Get a record by ID. Absence is `Ok(None)`, not an error.
pub fn get_record(conn: &Connection, id: RecordId) -> Result<Option<MediaRecord>> {
    match conn.query_row(
        &format!("SELECT {} FROM recordings WHERE id = ?", RECORD_COLUMNS),
        [id.to_string()],
        parse_record_row,
    ) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List records matching a filter, at most [`MAX_LIST_RESULTS`] of them.
pub fn list_records(conn: &Connection, filter: &RecordFilter) -> Result<Vec<MediaRecord>> {
    let query = RecordQuery::build(filter);

    let mut stmt = conn
        .prepare(query.sql())
        .map_err(|e| Error::database(e.to_string()))?;

    let records = stmt
        .query_map(&*query.params(), parse_record_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(records)
}

/// Every speaker that appears on at least one record, sorted and deduplicated.
pub fn list_speakers(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT speaker FROM recordings ORDER BY speaker ASC")
        .map_err(|e| Error::database(e.to_string()))?;

    let speakers = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(speakers)
}

/// Total number of records in the catalog.
pub fn count_records(conn: &Connection) -> Result<u64> {
    conn.query_row("SELECT COUNT(*) FROM recordings", [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(|e| Error::database(e.to_string()))
}
