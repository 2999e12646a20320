use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use serde_json::{Value, json};

use reflex_core::csrf::CSRF_HEADER;
use reflex_core::scoring::{compute_score, time_left};
use reflex_http::{HttpResultsService, HttpServiceConfig};

pub const GAME_SECS: f64 = 30.0;

/// What the stub stored for a finished session.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    pub hits: u32,
    pub combos: u32,
    pub duration: f64,
    pub score: u32,
}

#[derive(Debug, Clone, Copy)]
pub enum StubMode {
    /// Behave like the real results service.
    Normal,
    /// Answer 200 with a body that is not JSON.
    Garbage,
    /// Answer 503 this many times before behaving normally.
    FailFirst(u32),
}

struct StubState {
    csrf_token: Option<String>,
    mode: StubMode,
    failures: AtomicU32,
    requests: AtomicU32,
    results: Mutex<HashMap<String, StoredResult>>,
}

/// In-process results service answering `POST /finish/{session_id}/`.
pub struct TestServer {
    pub addr: SocketAddr,
    state: Arc<StubState>,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Stub expecting `csrf_token` in the anti-forgery header.
    pub async fn new(csrf_token: &str) -> Self {
        Self::start(Some(csrf_token.to_string()), StubMode::Normal).await
    }

    pub async fn with_mode(csrf_token: &str, mode: StubMode) -> Self {
        Self::start(Some(csrf_token.to_string()), mode).await
    }

    /// Stub that does not check the anti-forgery header.
    pub async fn without_csrf() -> Self {
        Self::start(None, StubMode::Normal).await
    }

    async fn start(csrf_token: Option<String>, mode: StubMode) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(StubState {
            csrf_token,
            mode,
            failures: AtomicU32::new(0),
            requests: AtomicU32::new(0),
            results: Mutex::new(HashMap::new()),
        });
        let app = Router::new()
            .route("/finish/{session_id}/", post(finish))
            .with_state(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            state,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn service(&self) -> HttpResultsService {
        HttpResultsService::new(HttpServiceConfig {
            base_url: self.base_url(),
            timeout_secs: 5,
            ..HttpServiceConfig::default()
        })
        .unwrap()
    }

    pub fn result(&self, session_id: &str) -> Option<StoredResult> {
        self.state.results.lock().unwrap().get(session_id).cloned()
    }

    pub fn request_count(&self) -> u32 {
        self.state.requests.load(Ordering::SeqCst)
    }
}

async fn finish(
    State(state): State<Arc<StubState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    state.requests.fetch_add(1, Ordering::SeqCst);

    if let Some(expected) = &state.csrf_token {
        let sent = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
        if sent != Some(expected.as_str()) {
            return reply(StatusCode::FORBIDDEN, json!({ "error": "CSRF verification failed" }));
        }
    }

    match state.mode {
        StubMode::Garbage => return (StatusCode::OK, "<html>oops</html>".to_string()),
        StubMode::FailFirst(n) if state.failures.fetch_add(1, Ordering::SeqCst) < n => {
            return reply(StatusCode::SERVICE_UNAVAILABLE, json!({ "error": "busy" }));
        },
        _ => {},
    }

    let Ok(payload) = serde_json::from_str::<Value>(&body) else {
        return reply(StatusCode::BAD_REQUEST, json!({ "error": "invalid JSON" }));
    };
    let hits = payload["hits"].as_u64().unwrap_or(0) as u32;
    let combos = payload["combos"].as_u64().unwrap_or(0) as u32;
    let duration = payload["duration"].as_f64().unwrap_or(0.0);

    let mut results = state.results.lock().unwrap();
    if results.contains_key(&session_id) {
        return reply(StatusCode::OK, json!({ "status": "finished" }));
    }
    let score = compute_score(hits, combos, time_left(duration, GAME_SECS));
    results.insert(
        session_id.clone(),
        StoredResult {
            hits,
            combos,
            duration,
            score,
        },
    );
    reply(
        StatusCode::OK,
        json!({ "status": "ok", "redirect_url": format!("/results/{session_id}/") }),
    )
}

fn reply(status: StatusCode, body: Value) -> (StatusCode, String) {
    (status, body.to_string())
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
