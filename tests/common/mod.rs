//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which builds a full [`AppContext`] over a
//! database and upload directory inside a temp dir, and drives the router
//! with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use homily::config::Config;
use homily::server::{create_router, AppContext};
use homily_db::models::{MediaRecord, NewRecord};
use homily_db::pool::{init_pool, DbPool, PooledConnection};
use homily_db::queries::records;

pub const BOUNDARY: &str = "homily-test-boundary";

/// A response with its body fully read.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub upload_dir: PathBuf,
    dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a harness whose storage paths point into a fresh temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let upload_dir = dir.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).expect("failed to create upload dir");

        config.storage.database_path = dir.path().join("homily.db");
        config.storage.upload_dir = upload_dir.clone();

        let db = init_pool(&config.storage.database_path.to_string_lossy())
            .expect("failed to create pool");
        let ctx = AppContext::new(config, db.clone());

        Self {
            ctx,
            db,
            upload_dir,
            dir,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> PooledConnection {
        homily_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// A scratch directory outside the upload store.
    pub fn scratch_dir(&self) -> PathBuf {
        let path = self.dir.path().join("scratch");
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    /// Write `data` into the upload dir and catalog it.
    pub fn add_recording(&self, title: &str, speaker: &str, date: &str, data: &[u8]) -> MediaRecord {
        let path = self.upload_dir.join(format!("{}.mp3", uuid::Uuid::new_v4()));
        std::fs::write(&path, data).unwrap();

        records::create_record(
            &self.conn(),
            &NewRecord {
                title: title.to_string(),
                speaker: speaker.to_string(),
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                filename: format!("{}.mp3", title),
                storage_path: path.to_string_lossy().into_owned(),
                mime_type: "audio/mpeg".to_string(),
                size_bytes: data.len() as u64,
            },
        )
        .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_range(&self, uri: &str, range: &str) -> TestResponse {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::RANGE, range)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn upload(&self, form: MultipartForm) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/api/admin/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(form.finish()))
                .unwrap(),
        )
        .await
    }

    /// Names of the files currently in the upload directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.upload_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Minimal multipart/form-data body builder.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}
