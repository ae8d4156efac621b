//! Shared fixtures for the integration suites.
//!
//! # Design
//! `RouterTransport` drives the mock server's router in-process, so store
//! tests need no sockets. `CountingTransport` and `FaultyTransport` wrap any
//! transport to observe or break individual requests. `spawn_server` starts
//! the mock server on a random port for the suites that go over real HTTP.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::Request;
use axum::Router;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tower::ServiceExt;

use todo_sync::{
    ApiError, HttpMethod, HttpRequest, HttpResponse, Todo, TodoApi, TodoClient, TodoStore, Transport,
};

pub const BASE_URL: &str = "http://mock.local";

// --- transports ---

/// Executes requests against an in-process mock server router.
#[derive(Clone)]
pub struct RouterTransport {
    router: Router,
}

impl RouterTransport {
    pub fn new() -> Self {
        Self {
            router: mock_server::app(),
        }
    }
}

#[async_trait]
impl Transport for RouterTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = Request::builder()
            .method(request.method.as_str())
            .uri(request.path.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let http_request = builder
            .body(request.body.unwrap_or_default())
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let response = self
            .router
            .clone()
            .oneshot(http_request)
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?
            .to_bytes();

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// Records every request before passing it on.
pub struct CountingTransport<T> {
    inner: T,
    calls: AtomicUsize,
    log: Mutex<Vec<(HttpMethod, String)>>,
}

impl<T> CountingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(HttpMethod, String)> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl<T: Transport> Transport for CountingTransport<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push((request.method, request.path.clone()));
        self.inner.execute(request).await
    }
}

struct Rule {
    method: HttpMethod,
    suffix: String,
    response: Option<HttpResponse>,
    delay: Duration,
}

impl Rule {
    fn matches(&self, request: &HttpRequest) -> bool {
        self.method == request.method && request.path.ends_with(self.suffix.as_str())
    }
}

/// Answers canned responses or delays requests for configured routes; every
/// other request goes through untouched.
pub struct FaultyTransport<T> {
    inner: T,
    rules: Mutex<Vec<Rule>>,
}

impl<T> FaultyTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            rules: Mutex::new(Vec::new()),
        }
    }

    /// Answer 500 to requests whose method matches and whose URL ends with
    /// `suffix`.
    pub fn fail(&self, method: HttpMethod, suffix: impl Into<String>) {
        self.respond(method, suffix, 500, r#"{"error":"Internal server error"}"#);
    }

    /// Answer matching requests with `status` and `body` instead of the server.
    pub fn respond(&self, method: HttpMethod, suffix: impl Into<String>, status: u16, body: &str) {
        self.rules.lock().push(Rule {
            method,
            suffix: suffix.into(),
            response: Some(HttpResponse {
                status,
                headers: vec![("content-type".to_string(), "text/html".to_string())],
                body: body.to_string(),
            }),
            delay: Duration::ZERO,
        });
    }

    /// Hold matching requests for `delay` before passing them on.
    pub fn delay(&self, method: HttpMethod, suffix: impl Into<String>, delay: Duration) {
        self.rules.lock().push(Rule {
            method,
            suffix: suffix.into(),
            response: None,
            delay,
        });
    }

    pub fn heal(&self) {
        self.rules.lock().clear();
    }
}

#[async_trait]
impl<T: Transport> Transport for FaultyTransport<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let (canned, delay) = {
            let rules = self.rules.lock();
            let rule = rules.iter().find(|rule| rule.matches(&request));
            (
                rule.and_then(|rule| rule.response.clone()),
                rule.map_or(Duration::ZERO, |rule| rule.delay),
            )
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match canned {
            Some(response) => Ok(response),
            None => self.inner.execute(request).await,
        }
    }
}

/// No server reachable.
pub struct OfflineTransport;

#[async_trait]
impl Transport for OfflineTransport {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
        Err(ApiError::Network("connection refused".to_string()))
    }
}

// --- fixtures ---

pub type Counted = Arc<CountingTransport<RouterTransport>>;
pub type Faulty = Arc<FaultyTransport<RouterTransport>>;

pub fn api_with<T: Transport>(transport: T) -> TodoApi<T> {
    TodoApi::new(TodoClient::new(BASE_URL), transport)
}

/// Store over a fresh in-process server, plus a handle for counting requests
/// and a second API sharing the same server for out-of-band changes.
pub fn counted_store() -> (TodoStore<Counted>, Counted, TodoApi<RouterTransport>) {
    let server = RouterTransport::new();
    let counter = Arc::new(CountingTransport::new(server.clone()));
    let store = TodoStore::new(api_with(counter.clone()));
    (store, counter, api_with(server))
}

/// Store whose requests can be made to fail selectively.
pub fn faulty_store() -> (TodoStore<Faulty>, Faulty) {
    let faulty = Arc::new(FaultyTransport::new(RouterTransport::new()));
    (TodoStore::new(api_with(faulty.clone())), faulty)
}

/// Start the mock server on a random local port and return its base URL.
pub async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { mock_server::run(listener).await });
    format!("http://{addr}")
}

// --- test data ---

pub mod test_data {
    pub const VALID: [(&str, bool); 5] = [
        ("Complete project proposal", false),
        ("Buy groceries for the week", false),
        ("Schedule dentist appointment", true),
        ("Review code changes", false),
        ("Update website content", true),
    ];

    pub const SPECIAL_CHARACTERS: &str = "Todo with special characters: !@#$%^&*()[]{}|;:,.<>?";
    pub const EMOJI: &str = "Todo with emoji 📝 ✅ 🚀";

    pub fn edge_case_titles() -> Vec<String> {
        vec![
            "A".to_string(),
            "X".repeat(250),
            SPECIAL_CHARACTERS.to_string(),
            EMOJI.to_string(),
        ]
    }

    pub fn invalid_titles() -> Vec<String> {
        vec![String::new(), "   ".to_string(), "X".repeat(251)]
    }

    pub const BULK: [(&str, bool); 5] = [
        ("Task 1 - Active", false),
        ("Task 2 - Active", false),
        ("Task 3 - Completed", true),
        ("Task 4 - Active", false),
        ("Task 5 - Completed", true),
    ];
}

// --- assertions ---

pub fn assert_valid_todo(todo: &Todo) {
    assert!(todo.id > 0, "id should be server-assigned: {todo:?}");
    assert!(!todo.title.trim().is_empty(), "title should not be blank: {todo:?}");
    assert!(todo.updated_at >= todo.created_at, "timestamps out of order: {todo:?}");
}

pub fn assert_newest_first(todos: &[Todo]) {
    for pair in todos.windows(2) {
        assert!(
            pair[0].created_at >= pair[1].created_at,
            "todo {} listed before newer todo {}",
            pair[0].id,
            pair[1].id
        );
    }
}

pub fn ids(todos: &[Todo]) -> Vec<u64> {
    todos.iter().map(|todo| todo.id).collect()
}
