//! Database query modules.
//!
//! - records: catalog inserts, lookups, listings, and the speaker index

pub mod records;
