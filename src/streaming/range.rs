//! HTTP `Range` header parsing.
//!
//! Only a single `bytes=<start>-<end?>` span is accepted. Suffix ranges
//! (`bytes=-500`) and multi-range lists are rejected as malformed, and both
//! malformed and out-of-bounds requests end up as 416 responses.

use std::fmt;

/// An inclusive byte span inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the span. Never zero.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for this span.
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_size)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Why a range header could not be served.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("malformed range header: {0:?}")]
    Malformed(String),

    #[error("range starting at {start} is outside a file of {size} bytes")]
    OutOfBounds { start: u64, end: Option<u64>, size: u64 },

    #[error("range start {start} is after end {end}")]
    Inverted { start: u64, end: u64 },
}

/// `Content-Range` value sent with a 416 response.
pub fn unsatisfied_content_range(total_size: u64) -> String {
    format!("bytes */{}", total_size)
}

fn parse_offset(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a `Range` header against the real size of the file.
///
/// Supports formats:
/// - bytes=0-499
/// - bytes=500- (to end of file)
///
/// Either bound at or past `file_size` is out of bounds, so nothing in a
/// zero-length file is addressable.
pub fn parse_range_header(header: &str, file_size: u64) -> Result<ByteRange, RangeError> {
    let malformed = || RangeError::Malformed(header.to_string());

    let spec = header.trim().strip_prefix("bytes=").ok_or_else(malformed)?;
    if spec.contains(',') {
        return Err(malformed());
    }

    let (start, end) = spec.split_once('-').ok_or_else(malformed)?;
    let start = parse_offset(start.trim()).ok_or_else(malformed)?;
    let end = match end.trim() {
        "" => None,
        end => Some(parse_offset(end).ok_or_else(malformed)?),
    };

    let out_of_bounds = start >= file_size || end.is_some_and(|end| end >= file_size);
    if out_of_bounds {
        return Err(RangeError::OutOfBounds {
            start,
            end,
            size: file_size,
        });
    }

    let end = end.unwrap_or(file_size - 1);
    if start > end {
        return Err(RangeError::Inverted { start, end });
    }

    Ok(ByteRange { start, end })
}
