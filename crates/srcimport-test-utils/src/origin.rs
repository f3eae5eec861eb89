//! A minimal in-process HTTP origin for provider tests.
//!
//! Serves a fixed map of paths to bytes over a loopback listener on an
//! ephemeral port. `GET` and `HEAD` both work (axum answers `HEAD` for
//! `get` routes with the body stripped), `Last-Modified` headers are
//! configurable, and entries can demand a bearer token to exercise the
//! authenticated-request path.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chrono::{DateTime, Utc};

/// One servable file.
#[derive(Debug, Clone)]
pub struct MockFile {
    bytes: Vec<u8>,
    last_modified: Option<String>,
    expect_bearer: Option<String>,
}

impl MockFile {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            last_modified: None,
            expect_bearer: None,
        }
    }

    /// Attach a `Last-Modified` header (IMF-fixdate format).
    pub fn last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        self
    }

    /// Respond 401 unless the request carries `Authorization: Bearer <token>`.
    pub fn expect_bearer(mut self, token: &str) -> Self {
        self.expect_bearer = Some(token.to_string());
        self
    }
}

#[derive(Clone)]
struct OriginState {
    files: Arc<HashMap<String, MockFile>>,
}

/// A running mock origin; shuts down on drop.
pub struct MockOrigin {
    addr: SocketAddr,
    server: tokio::task::JoinHandle<()>,
}

impl MockOrigin {
    /// Start serving `files`, keyed by path without a leading slash
    /// (e.g. `"owner/repo/main/src/File.cs"`).
    pub async fn serve(files: HashMap<String, MockFile>) -> Self {
        let state = OriginState {
            files: Arc::new(files),
        };
        let app = Router::new()
            .route("/{*path}", get(serve_file))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock origin");
        let addr = listener.local_addr().expect("mock origin local addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock origin server");
        });

        Self { addr, server }
    }

    /// Base URL, e.g. `http://127.0.0.1:49152`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full URL for a served path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }
}

impl Drop for MockOrigin {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn serve_file(
    State(state): State<OriginState>,
    Path(path): Path<String>,
    request_headers: HeaderMap,
) -> Response {
    let Some(file) = state.files.get(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(expected) = &file.expect_bearer {
        let authorized = request_headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {expected}"));
        if !authorized {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let mut headers = HeaderMap::new();
    if let Some(last_modified) = &file.last_modified {
        headers.insert(
            header::LAST_MODIFIED,
            last_modified.parse().expect("valid Last-Modified value"),
        );
    }
    (StatusCode::OK, headers, file.bytes.clone()).into_response()
}
