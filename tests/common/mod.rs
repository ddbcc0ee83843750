#![allow(dead_code)]

use actix_web::{HttpRequest, HttpResponse, HttpServer, http::StatusCode, web};
use async_trait::async_trait;
use chat_relay_rs::completion::{CompletionError, CompletionService};
use chat_relay_rs::io_struct::{CompletionRequest, CompletionResponse};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Outcome = Box<dyn Fn() -> Result<CompletionResponse, CompletionError> + Send + Sync>;

/// Completion service double that counts calls and records what it was sent.
pub struct StubCompletion {
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, CompletionRequest)>>,
    outcome: Outcome,
}

impl StubCompletion {
    pub fn new(
        outcome: impl Fn() -> Result<CompletionResponse, CompletionError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(StubCompletion {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            outcome: Box::new(outcome),
        })
    }

    pub fn replying(body: Value) -> Arc<Self> {
        Self::new(move || Ok(serde_json::from_value(body.clone()).unwrap()))
    }

    pub fn failing(status: Option<u16>, message: &str) -> Arc<Self> {
        let message = message.to_string();
        Self::new(move || {
            Err(CompletionError::Service {
                status,
                message: message.clone(),
            })
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<(String, CompletionRequest)> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((api_key.to_string(), request.clone()));
        (self.outcome)()
    }
}

pub fn completion_body(content: Value) -> Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-3.5-turbo-0125",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 25, "completion_tokens": 7, "total_tokens": 32}
    })
}

/// What the mock upstream saw: authorization header and JSON body.
pub type SeenRequests = Arc<Mutex<Vec<(Option<String>, Value)>>>;

#[derive(Clone)]
struct MockUpstream {
    status: u16,
    body: Value,
    seen: SeenRequests,
}

async fn mock_completions(
    req: HttpRequest,
    body: web::Json<Value>,
    mock: web::Data<MockUpstream>,
) -> HttpResponse {
    let auth = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.seen.lock().unwrap().push((auth, body.into_inner()));
    HttpResponse::build(StatusCode::from_u16(mock.status).unwrap()).json(&mock.body)
}

/// Starts an OpenAI-like server on a free port and returns its `/v1` base URL.
pub fn spawn_upstream(status: u16, body: Value) -> (String, SeenRequests) {
    let seen = SeenRequests::default();
    let mock = web::Data::new(MockUpstream {
        status,
        body,
        seen: seen.clone(),
    });
    let server = HttpServer::new(move || {
        actix_web::App::new()
            .app_data(mock.clone())
            .route("/v1/chat/completions", web::post().to(mock_completions))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    (format!("http://{}/v1", addr), seen)
}

/// A base URL nothing listens on.
pub fn unused_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/v1", port)
}
