//! Drives the HTTP service in-process, backed by a JSON snapshot in a temporary
//! directory and a clock that only moves when told to.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{TimeZone as _, Utc};
use http::{header, HeaderMap, Method, Request, StatusCode};
use http_body_util::{BodyExt as _, Full};
use list_o_matic_backend::access::ApiKeyPolicy;
use list_o_matic_backend::clock::ManualClock;
use list_o_matic_backend::registry::Registry;
use list_o_matic_backend::ListService;
use list_o_matic_database::JsonFileStore;
use serde_json::Value;
use tempfile::TempDir;
use uuid::Uuid;

pub const ADMIN_KEY: &str = "correct horse battery staple";

pub struct TestClient {
    service: ListService,
    clock: Arc<ManualClock>,
    directory: Arc<TempDir>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The id answered by a create request.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        assert_eq!(self.status, StatusCode::CREATED, "{}", self.text());
        self.json()["uuid"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .unwrap_or_else(|| panic!("no uuid in {}", self.text()))
    }
}

impl TestClient {
    #[must_use]
    pub fn new() -> Self {
        let directory = Arc::new(tempfile::tempdir().unwrap_or_else(|err| panic!("{err}")));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2022, 1, 13, 19, 0, 0)
                .single()
                .unwrap_or_default(),
        ));
        Self::start(directory, clock)
    }

    fn start(directory: Arc<TempDir>, clock: Arc<ManualClock>) -> Self {
        let store = Arc::new(JsonFileStore::new(Self::snapshot_path(&directory)));
        let registry = Registry::load(store).with_clock(Arc::clone(&clock));
        let policy = ApiKeyPolicy::new([ApiKeyPolicy::digest(ADMIN_KEY)]);
        Self {
            service: ListService::new(Arc::new(registry), Arc::new(policy)),
            clock,
            directory,
        }
    }

    fn snapshot_path(directory: &TempDir) -> PathBuf {
        directory.path().join("talking_lists.json")
    }

    /// A fresh service reading the snapshot this one wrote.
    #[must_use]
    pub fn restart(&self) -> Self {
        Self::start(Arc::clone(&self.directory), Arc::clone(&self.clock))
    }

    #[must_use]
    pub fn snapshot(&self) -> PathBuf {
        Self::snapshot_path(&self.directory)
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.clock.advance(chrono::Duration::minutes(minutes));
    }

    /// Request without credentials.
    pub async fn public(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        self.send(method, uri, body, None).await
    }

    /// Request carrying the admin key.
    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        self.send(method, uri, body, Some(ADMIN_KEY)).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        key: Option<&str>,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            request = request.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }
        let body = body.map_or_else(Bytes::new, |body| Bytes::from(body.to_string()));
        let request = request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(body))
            .unwrap_or_else(|err| panic!("{err}"));

        let response = self.service.handle(request).await;
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(infallible) => match infallible {},
        };
        TestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}
