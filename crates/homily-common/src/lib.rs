//! Homily-Common: Shared types, IDs, and errors.
//!
//! This crate provides common functionality used across homily:
//!
//! - **Typed IDs**: [`RecordId`], an opaque UUID wrapper for catalog records
//! - **Core Types**: [`SortOrder`] for catalog listings
//! - **Path Utilities**: audio extension checks and mime guessing
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use homily_common::{RecordId, SortOrder, Error, Result};
//! use homily_common::paths::is_audio_file;
//! use std::path::Path;
//!
//! let id = RecordId::new();
//! assert_eq!(SortOrder::default(), SortOrder::DateDesc);
//! assert!(is_audio_file(Path::new("talk.mp3")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::conflict("recording already exists"))
//! }
//! # let _ = id;
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
