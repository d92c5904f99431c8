#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Router;
use serde_json::Value;

use schema_deploy::Config;

pub const SERVICE_KEY: &str = "test-service-key";
pub const API_KEY: &str = "test-anon-key";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub apikey: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Option<Duration>,
}

impl MockReply {
    pub fn ok() -> Self {
        Self::status(StatusCode::OK, "null")
    }

    pub fn status(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Responder = Arc<dyn Fn(&Value) -> MockReply + Send + Sync>;

#[derive(Clone)]
struct MockState {
    respond: Responder,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockApi {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a local stand-in for the database REST API. Every request is
/// recorded and answered by `respond`, which sees the decoded JSON body.
pub async fn spawn_mock_api<F>(respond: F) -> MockApi
where
    F: Fn(&Value) -> MockReply + Send + Sync + 'static,
{
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        respond: Arc::new(respond),
        requests: Arc::clone(&requests),
    };

    let app = Router::new().fallback(handle).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockApi {
        base_url: format!("http://{addr}"),
        requests,
    }
}

async fn handle(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let recorded = RecordedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header("authorization"),
        apikey: header("apikey"),
        body: body.clone(),
    };
    state.requests.lock().unwrap().push(recorded);

    let reply = (state.respond)(&body);
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    (reply.status, reply.body)
}

pub fn test_config(base_url: &str, overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("SUPABASE_URL".to_string(), base_url.to_string()),
        ("SUPABASE_SERVICE_ROLE_KEY".to_string(), SERVICE_KEY.to_string()),
        ("SUPABASE_API_KEY".to_string(), API_KEY.to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub fn sql_of(request: &RecordedRequest, field: &str) -> String {
    request.body[field].as_str().unwrap_or_default().to_string()
}
