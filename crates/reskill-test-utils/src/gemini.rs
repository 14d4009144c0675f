//! Fake Gemini `generateContent` endpoint.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde_json::{Value, json};

use crate::Served;

/// One scripted response.
#[derive(Debug, Clone)]
pub enum GeminiReply {
    /// 200 with the text as the first candidate.
    Text(String),
    /// The given status and raw body.
    Status(u16, String),
    /// 200 with an arbitrary JSON body.
    Body(Value),
}

/// A request the fake received.
#[derive(Debug, Clone)]
pub struct RecordedGeneration {
    pub model: String,
    pub key: Option<String>,
    pub body: Value,
}

impl RecordedGeneration {
    pub fn prompt(&self) -> Option<&str> {
        self.body["contents"][0]["parts"][0]["text"].as_str()
    }

    /// Whether JSON output mode was requested.
    pub fn json_mode(&self) -> bool {
        self.body["generationConfig"]["responseMimeType"] == "application/json"
    }
}

#[derive(Clone, Default)]
struct GeminiState {
    replies: Arc<Mutex<VecDeque<GeminiReply>>>,
    requests: Arc<Mutex<Vec<RecordedGeneration>>>,
}

pub struct FakeGemini {
    served: Served,
    state: GeminiState,
}

impl FakeGemini {
    pub async fn start() -> Self {
        let state = GeminiState::default();
        let router = Router::new()
            .route("/v1beta/models/{call}", post(generate))
            .with_state(state.clone());
        Self {
            served: Served::start(router).await,
            state,
        }
    }

    /// API root to configure the client with.
    pub fn endpoint(&self) -> String {
        format!("{}/v1beta", self.served.url())
    }

    /// Queue a reply. Replies are served in order; an empty queue answers 500.
    pub fn push(&self, reply: GeminiReply) {
        self.state.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(GeminiReply::Text(text.into()));
    }

    pub fn requests(&self) -> Vec<RecordedGeneration> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn generate(
    State(state): State<GeminiState>,
    Path(call): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let Some(model) = call.strip_suffix(":generateContent") else {
        return (StatusCode::NOT_FOUND, "unknown method").into_response();
    };
    state.requests.lock().unwrap().push(RecordedGeneration {
        model: model.to_string(),
        key: query.get("key").cloned(),
        body,
    });

    let reply = state.replies.lock().unwrap().pop_front();
    match reply {
        Some(GeminiReply::Text(text)) => Json(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        }))
        .into_response(),
        Some(GeminiReply::Status(status, body)) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
        Some(GeminiReply::Body(body)) => Json(body).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "no scripted reply").into_response(),
    }
}
