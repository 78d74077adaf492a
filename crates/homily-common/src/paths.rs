//! Path utilities for detecting audio files by extension.
//!
//! Used by the bulk importer to pick files out of a directory and to guess a
//! content type when no client-supplied one is available.

use std::path::Path;

/// Audio extensions accepted by the bulk importer, with their mime types.
const AUDIO_TYPES: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("ogg", "audio/ogg"),
];

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a path has a supported audio file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use homily_common::paths::is_audio_file;
///
/// assert!(is_audio_file(Path::new("sermon.mp3")));
/// assert!(is_audio_file(Path::new("/archive/Talk.WAV")));
/// assert!(!is_audio_file(Path::new("notes.txt")));
/// ```
pub fn is_audio_file(path: &Path) -> bool {
    extension_lowercase(path)
        .map(|ext| AUDIO_TYPES.iter().any(|(known, _)| *known == ext))
        .unwrap_or(false)
}

/// Guess a mime type from a file extension.
///
/// Unknown extensions map to `application/octet-stream`.
pub fn guess_mime_type(path: &Path) -> &'static str {
    extension_lowercase(path)
        .and_then(|ext| {
            AUDIO_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or("application/octet-stream")
}
