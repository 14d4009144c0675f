//! Fake Realtime Database REST server over a [`MemoryStore`].

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::any;
use serde_json::{Value, json};
use tokio::sync::broadcast;

use reskill_store::{MemoryStore, Store, StoreError};

use crate::Served;

/// A request the fake received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
}

impl RecordedRequest {
    pub fn auth(&self) -> Option<&str> {
        self.query.get("auth").map(String::as_str)
    }
}

#[derive(Debug, Clone)]
enum Control {
    Cancel(String),
    AuthRevoked,
}

#[derive(Clone)]
struct DatabaseState {
    store: MemoryStore,
    required_auth: Arc<Mutex<Option<String>>>,
    fail_next: Arc<Mutex<Option<(u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    control: broadcast::Sender<Control>,
}

pub struct FakeDatabase {
    served: Served,
    state: DatabaseState,
}

impl FakeDatabase {
    pub async fn start() -> Self {
        Self::with_store(MemoryStore::new()).await
    }

    pub async fn with_store(store: MemoryStore) -> Self {
        let (control, _) = broadcast::channel(16);
        let state = DatabaseState {
            store,
            required_auth: Arc::default(),
            fail_next: Arc::default(),
            requests: Arc::default(),
            control,
        };
        let router = Router::new()
            .route("/{*path}", any(handle))
            .with_state(state.clone());
        Self {
            served: Served::start(router).await,
            state,
        }
    }

    /// Database URL to configure the client with.
    pub fn url(&self) -> String {
        self.served.url()
    }

    /// The backing tree.
    pub fn store(&self) -> &MemoryStore {
        &self.state.store
    }

    /// Reject requests whose `auth` parameter is not `token`.
    pub fn require_auth(&self, token: impl Into<String>) {
        *self.state.required_auth.lock().unwrap() = Some(token.into());
    }

    /// Answer the next request with this status and body.
    pub fn fail_next(&self, status: u16, body: impl Into<String>) {
        *self.state.fail_next.lock().unwrap() = Some((status, body.into()));
    }

    /// Send `cancel` to every open event stream and close it.
    pub fn cancel_streams(&self, reason: impl Into<String>) {
        let _ = self.state.control.send(Control::Cancel(reason.into()));
    }

    /// Send `auth_revoked` to every open event stream and close it.
    pub fn revoke_streams(&self) {
        let _ = self.state.control.send(Control::AuthRevoked);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn store_error(e: StoreError) -> Response {
    error(StatusCode::BAD_REQUEST, e.to_string())
}

async fn handle(
    State(state): State<DatabaseState>,
    method: Method,
    Path(raw_path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(path) = raw_path.strip_suffix(".json") else {
        return error(StatusCode::NOT_FOUND, "path must end in .json");
    };
    let path = path.trim_matches('/').to_string();

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
    });

    if let Some((status, body)) = state.fail_next.lock().unwrap().take() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, body).into_response();
    }
    let required = state.required_auth.lock().unwrap().clone();
    if let Some(token) = required {
        if query.get("auth") != Some(&token) {
            return error(StatusCode::UNAUTHORIZED, "Permission denied");
        }
    }

    let silent = query.get("print").is_some_and(|p| p == "silent");
    let streaming = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"));

    match method {
        Method::GET if streaming => stream(state, &path).await,
        Method::GET => match state.store.get(&path).await {
            Ok(value) => Json(value.unwrap_or(Value::Null)).into_response(),
            Err(e) => store_error(e),
        },
        Method::PUT => {
            let value: Value = match serde_json::from_slice(&body) {
                Ok(v) => v,
                Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
            };
            if let Err(e) = state.store.set(&path, &value).await {
                return store_error(e);
            }
            if silent {
                StatusCode::NO_CONTENT.into_response()
            } else {
                Json(value).into_response()
            }
        }
        Method::PATCH => {
            let fields = match serde_json::from_slice::<Value>(&body) {
                Ok(Value::Object(fields)) => fields,
                Ok(_) => return error(StatusCode::BAD_REQUEST, "PATCH body must be an object"),
                Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
            };
            if let Err(e) = state.store.update(&path, &fields).await {
                return store_error(e);
            }
            if silent {
                StatusCode::NO_CONTENT.into_response()
            } else {
                Json(Value::Object(fields)).into_response()
            }
        }
        _ => error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
    }
}

enum Next {
    Value(Option<Value>),
    Control(Control),
    Done,
}

/// Event stream: a `put` of the whole value at `path` after every change.
async fn stream(state: DatabaseState, path: &str) -> Response {
    let mut subscription = match state.store.subscribe(path).await {
        Ok(s) => s,
        Err(e) => return store_error(e),
    };
    let mut control = state.control.subscribe();

    let events = async_stream::stream! {
        loop {
            let next = tokio::select! {
                snapshot = subscription.next() => match snapshot {
                    Some(snapshot) => Next::Value(snapshot.value),
                    None => Next::Done,
                },
                signal = control.recv() => match signal {
                    Ok(signal) => Next::Control(signal),
                    Err(_) => Next::Done,
                },
            };
            match next {
                Next::Value(value) => {
                    let payload = json!({ "path": "/", "data": value.unwrap_or(Value::Null) });
                    yield Ok::<Event, Infallible>(Event::default().event("put").data(payload.to_string()));
                }
                Next::Control(Control::Cancel(reason)) => {
                    yield Ok(Event::default().event("cancel").data(reason));
                    break;
                }
                Next::Control(Control::AuthRevoked) => {
                    yield Ok(Event::default().event("auth_revoked").data("credential is no longer valid"));
                    break;
                }
                Next::Done => break,
            }
        }
    };
    Sse::new(events).into_response()
}
