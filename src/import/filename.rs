//! Metadata guessed from a file name of the form `Speaker - Title - YYYY-MM-DD`.

use chrono::NaiveDate;
use homily_db::models::parse_record_date;

/// Speaker used when the name has no speaker part.
pub const UNKNOWN_SPEAKER: &str = "Unknown";

/// Date used when the name carries no valid date.
pub fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameMetadata {
    pub speaker: String,
    pub title: String,
    pub date: NaiveDate,
}

/// Split a base name (no extension) on `" - "`.
///
/// Missing or blank parts fall back: speaker to `Unknown`, title to the whole
/// base name, date to 2000-01-01. Anything after the third part is ignored.
pub fn parse_filename(base_name: &str) -> FilenameMetadata {
    let mut parts = base_name.split(" - ").map(str::trim);
    let mut next_part = || parts.next().filter(|p| !p.is_empty());

    let speaker = next_part().unwrap_or(UNKNOWN_SPEAKER).to_string();
    let title = next_part()
        .map(str::to_string)
        .unwrap_or_else(|| base_name.to_string());
    let date = next_part()
        .and_then(|d| parse_record_date(d).ok())
        .unwrap_or_else(sentinel_date);

    FilenameMetadata {
        speaker,
        title,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_pattern() {
        let meta = parse_filename("Ali Hassan - On Patience - 2021-06-15");
        assert_eq!(meta.speaker, "Ali Hassan");
        assert_eq!(meta.title, "On Patience");
        assert_eq!(meta.date, date(2021, 6, 15));
    }

    #[test]
    fn test_missing_date_uses_sentinel() {
        let meta = parse_filename("Ali Hassan - On Patience");
        assert_eq!(meta.title, "On Patience");
        assert_eq!(meta.date, date(2000, 1, 1));
    }

    #[test]
    fn test_invalid_date_uses_sentinel() {
        let meta = parse_filename("Ali Hassan - On Patience - June 2021");
        assert_eq!(meta.date, date(2000, 1, 1));

        let meta = parse_filename("Ali Hassan - On Patience - 2021-02-30");
        assert_eq!(meta.date, date(2000, 1, 1));
    }

    #[test]
    fn test_single_part_is_speaker_and_title_falls_back() {
        let meta = parse_filename("friday_khutbah");
        assert_eq!(meta.speaker, "friday_khutbah");
        assert_eq!(meta.title, "friday_khutbah");
        assert_eq!(meta.date, date(2000, 1, 1));
    }

    #[test]
    fn test_blank_name_uses_unknown_speaker() {
        let meta = parse_filename("");
        assert_eq!(meta.speaker, UNKNOWN_SPEAKER);
        assert_eq!(meta.title, "");
    }

    #[test]
    fn test_hyphen_without_spaces_is_not_a_separator() {
        let meta = parse_filename("Abu-Bakr - Self-Discipline - 2019-03-03");
        assert_eq!(meta.speaker, "Abu-Bakr");
        assert_eq!(meta.title, "Self-Discipline");
        assert_eq!(meta.date, date(2019, 3, 3));
    }
}
