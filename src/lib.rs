//! Homily - catalog and playback server for recorded talks
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod import;
pub mod ingest;
pub mod server;
pub mod streaming;
