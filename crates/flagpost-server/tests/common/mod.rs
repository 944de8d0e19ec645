#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use flagpost_db::{create_pool, initialize_schema, DbPool, DbRuntimeSettings};
use flagpost_server::{app, AppState};
use serde_json::Value;
use tempfile::NamedTempFile;
use tower::ServiceExt;

/// A router backed by a freshly seeded database file.
pub struct TestServer {
    pub app: Router,
    pub pool: DbPool,
    // Keeps the database file alive for the duration of the test.
    _db_file: NamedTempFile,
}

pub fn setup() -> TestServer {
    let db_file = NamedTempFile::new().expect("failed to create temp db file");
    let pool = create_pool(db_file.path(), DbRuntimeSettings::default())
        .expect("failed to create pool");
    {
        let conn = pool.get().expect("failed to get connection");
        initialize_schema(&conn).expect("failed to initialize schema");
    }

    let app = app(AppState { pool: pool.clone() });

    TestServer {
        app,
        pool,
        _db_file: db_file,
    }
}

impl TestServer {
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("failed to build request");
        self.send(request).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.put_raw(uri, &body.to_string()).await
    }

    pub async fn put_raw(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("failed to build request");
        self.send(request).await
    }

    /// Sends `body` as a PUT with no `Content-Type` header.
    pub async fn put_untyped(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .expect("failed to build request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router should not fail");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let json = serde_json::from_slice(&bytes).expect("response body should be JSON");
        (status, json)
    }

    /// Reads the table directly, bypassing the API.
    pub fn rows(&self) -> Vec<(i64, String, bool)> {
        let conn = self.pool.get().expect("failed to get connection");
        let mut stmt = conn
            .prepare("SELECT id, name, enabled FROM feature_flags ORDER BY id")
            .expect("failed to prepare select");
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .expect("failed to query flags")
            .map(|r| r.expect("failed to decode row"))
            .collect()
    }

    pub fn execute(&self, sql: &str) {
        let conn = self.pool.get().expect("failed to get connection");
        conn.execute_batch(sql).expect("failed to execute sql");
    }
}
