//! Internal Rust models matching the database schema.
//!
//! [`NewRecord`] is what an ingestion path hands to the catalog once the bytes
//! are on disk; [`MediaRecord`] is the stored row.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use homily_common::{Error, RecordId, Result};
use serde::{Deserialize, Serialize};

/// Canonical text form of a recording date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One catalog entry describing an uploaded recording.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaRecord {
    pub id: RecordId,
    pub title: String,
    pub speaker: String,
    pub date: NaiveDate,
    pub filename: String,
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub duration_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Metadata for a recording whose file has already been stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub title: String,
    pub speaker: String,
    pub date: NaiveDate,
    pub filename: String,
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl NewRecord {
    /// Check required fields without touching the database.
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.title,
            &self.speaker,
            self.date,
            &self.filename,
            &self.storage_path,
            &self.mime_type,
            self.size_bytes,
        )
    }
}

impl MediaRecord {
    /// Build a record for `id`, stamped with the current time.
    pub fn new(id: RecordId, new: NewRecord) -> Self {
        Self {
            id,
            title: new.title,
            speaker: new.speaker,
            date: new.date,
            filename: new.filename,
            storage_path: new.storage_path,
            mime_type: new.mime_type,
            size_bytes: new.size_bytes,
            duration_seconds: None,
            created_at: Utc::now(),
        }
    }

    /// Check required fields without touching the database.
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.title,
            &self.speaker,
            self.date,
            &self.filename,
            &self.storage_path,
            &self.mime_type,
            self.size_bytes,
        )?;
        if matches!(self.duration_seconds, Some(d) if d < 0) {
            return Err(Error::validation("duration_seconds must not be negative"));
        }
        Ok(())
    }
}

fn validate_fields(
    title: &str,
    speaker: &str,
    date: NaiveDate,
    filename: &str,
    storage_path: &str,
    mime_type: &str,
    size_bytes: u64,
) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::validation("title is required"));
    }
    if speaker.trim().is_empty() {
        return Err(Error::validation("speaker is required"));
    }
    // Dates are stored as text; only four-digit years keep lexical order.
    if !(0..=9999).contains(&date.year()) {
        return Err(Error::validation(format!(
            "date year must be between 0000 and 9999, got {}",
            date.year()
        )));
    }
    if filename.trim().is_empty() {
        return Err(Error::validation("filename is required"));
    }
    if storage_path.trim().is_empty() {
        return Err(Error::validation("storage_path is required"));
    }
    if !is_audio_mime(mime_type) {
        return Err(Error::validation(format!(
            "mime_type must be an audio type, got '{}'",
            mime_type
        )));
    }
    if i64::try_from(size_bytes).is_err() {
        return Err(Error::validation("size_bytes is too large"));
    }
    Ok(())
}

/// Whether a content type names an audio format (`audio/<subtype>`).
pub fn is_audio_mime(mime_type: &str) -> bool {
    mime_type
        .strip_prefix("audio/")
        .is_some_and(|subtype| !subtype.trim().is_empty())
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// Rejects anything chrono would accept loosely (short years, missing zero
/// padding) as well as impossible dates such as `2023-02-30`.
pub fn parse_record_date(s: &str) -> Result<NaiveDate> {
    let bytes = s.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(Error::validation(format!(
            "date must be YYYY-MM-DD, got '{}'",
            s
        )));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| Error::validation(format!("'{}' is not a valid calendar date", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewRecord {
        NewRecord {
            title: "On Patience".to_string(),
            speaker: "Ali Hassan".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 6, 15).unwrap(),
            filename: "patience.mp3".to_string(),
            storage_path: "/tmp/uploads/patience.mp3".to_string(),
            mime_type: "audio/mpeg".to_string(),
            size_bytes: 42,
        }
    }

    #[test]
    fn test_valid_record() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_blank_fields_rejected() {
        for mutate in [
            (|r: &mut NewRecord| r.title = "   ".into()) as fn(&mut NewRecord),
            |r| r.speaker = String::new(),
            |r| r.filename = String::new(),
            |r| r.storage_path = " ".into(),
        ] {
            let mut record = sample();
            mutate(&mut record);
            assert!(matches!(record.validate(), Err(Error::InvalidInput(_))));
        }
    }

    #[test]
    fn test_non_audio_mime_rejected() {
        let mut record = sample();
        record.mime_type = "video/mp4".into();
        assert!(record.validate().is_err());

        record.mime_type = "audio/".into();
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut record = sample();
        record.size_bytes = u64::MAX;
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_date_outside_four_digit_years_rejected() {
        for date in [
            NaiveDate::from_ymd_opt(10000, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(-1, 12, 31).unwrap(),
        ] {
            let mut record = sample();
            record.date = date;
            assert!(matches!(record.validate(), Err(Error::InvalidInput(_))));
        }

        let mut record = sample();
        record.date = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        assert!(record.validate().is_ok());
        record.date = NaiveDate::from_ymd_opt(0, 1, 1).unwrap();
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_zero_size_is_valid() {
        let mut record = sample();
        record.size_bytes = 0;
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_media_record_new_keeps_fields() {
        let id = RecordId::new();
        let record = MediaRecord::new(id, sample());
        assert_eq!(record.id, id);
        assert_eq!(record.title, "On Patience");
        assert_eq!(record.duration_seconds, None);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_parse_record_date() {
        assert_eq!(
            parse_record_date("2020-01-01").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        assert!(parse_record_date("2020-1-01").is_err());
        assert!(parse_record_date("20-01-01").is_err());
        assert!(parse_record_date("2023-02-30").is_err());
        assert!(parse_record_date("2020/01/01").is_err());
        assert!(parse_record_date("").is_err());
    }

    #[test]
    fn test_record_serializes_date_as_iso() {
        let record = MediaRecord::new(RecordId::new(), sample());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2021-06-15");
    }
}
