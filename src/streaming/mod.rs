//! Media streaming module.
//!
//! Serves stored recordings with HTTP range support so players can seek.
//!
//! # Routes
//!
//! - `GET /recordings/{id}/stream` - Full or partial file content

mod direct;
mod range;

pub use direct::{
    open_stream, stream_recording, ByteSource, StreamHeaders, StreamOutcome, StreamStatus,
    STREAM_CHUNK_SIZE,
};
pub use range::{parse_range_header, unsatisfied_content_range, ByteRange, RangeError};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Create the streaming router, nested under `/api`.
pub fn stream_router() -> Router<AppContext> {
    Router::new().route("/recordings/:id/stream", get(stream_recording))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_router_creation() {
        let _router: Router<AppContext> = stream_router();
    }
}
