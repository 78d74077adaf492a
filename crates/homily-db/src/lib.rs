//! Homily-DB: the catalog store.
//!
//! This crate persists [`models::MediaRecord`] rows in SQLite using rusqlite
//! and r2d2 connection pooling, and answers the filtered, sorted and capped
//! listing queries the HTTP layer exposes.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use homily_db::models::NewRecord;
//! use homily_db::pool::{get_conn, init_pool};
//! use homily_db::queries::records::{self, RecordFilter};
//!
//! let pool = init_pool("/var/lib/homily/homily.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let record = records::create_record(&conn, &NewRecord {
//!     title: "On Patience".into(),
//!     speaker: "Ali Hassan".into(),
//!     date: NaiveDate::from_ymd_opt(2021, 6, 15).unwrap(),
//!     filename: "patience.mp3".into(),
//!     storage_path: "/srv/uploads/patience.mp3".into(),
//!     mime_type: "audio/mpeg".into(),
//!     size_bytes: 1024,
//! }).unwrap();
//!
//! let found = records::list_records(&conn, &RecordFilter::new().search("patience")).unwrap();
//! assert_eq!(found[0].id, record.id);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
