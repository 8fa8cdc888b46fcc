//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use critic_analyzers::AnalyzerRegistry;
use critic_core::config::{AppConfig, MetadataConfig};
use critic_metadata::{MetadataStore, SqliteStore};
use critic_server::{AppState, create_router};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server backed by a temporary SQLite database.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let db_path = temp_dir.path().join("metadata.db");
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path, 5)
                .await
                .expect("Failed to create metadata store"),
        );

        let mut config = AppConfig::for_testing();
        config.metadata = MetadataConfig::Sqlite {
            path: db_path,
            busy_timeout_secs: 5,
        };

        modifier(&mut config);

        let analyzers =
            AnalyzerRegistry::from_config(&config.analyzers).expect("Failed to build analyzers");

        critic_server::metrics::register_metrics();

        let state = AppState::new(config, metadata, analyzers).expect("Failed to create state");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Make a JSON request, returning the status and parsed body.
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        json_request(&self.router, method, uri, body, token).await
    }

    /// Send a raw body, returning the status and parsed body.
    pub async fn raw(
        &self,
        method: &str,
        uri: &str,
        body: Vec<u8>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/zip");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body)).unwrap();
        send(&self.router, request).await
    }

    /// Create a project as `token`'s user and return its ID.
    pub async fn create_project(&self, token: &str, name: &str) -> i64 {
        let (status, body) = self
            .json(
                "POST",
                "/api/projects",
                Some(serde_json::json!({ "name": name })),
                Some(token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");
        body["id"].as_i64().unwrap()
    }

    /// Write a file into a project and return its ID.
    pub async fn create_file(
        &self,
        token: &str,
        project_id: i64,
        path: &str,
        content: &str,
    ) -> i64 {
        let (status, body) = self
            .json(
                "POST",
                &format!("/api/projects/{project_id}/files"),
                Some(serde_json::json!({ "path": path, "content": content })),
                Some(token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create file failed: {body}");
        body["id"].as_i64().unwrap()
    }
}

/// Helper to make JSON requests.
#[allow(dead_code)]
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    send(router, builder.body(body).unwrap()).await
}

async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
