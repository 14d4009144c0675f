//! Server-sent event decoding for Realtime Database streaming reads.
//!
//! A streaming `GET` with `Accept: text/event-stream` yields events such as:
//!
//! ```text
//! event: put
//! data: {"path": "/", "data": {"weekId": "2025-03-w1", ...}}
//!
//! event: patch
//! data: {"path": "/tasks/0", "data": {"done": true}}
//! ```
//!
//! Event paths are relative to the subscribed location.

use serde::Deserialize;
use serde_json::Value;

use crate::error::StoreError;
use crate::paths;
use crate::tree;

/// One raw SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental frame decoder. Feed it byte chunks in arrival order.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buf.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&raw[..end]);
            if let Some(frame) = parse_frame(&text) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn parse_frame(text: &str) -> Option<SseFrame> {
    let mut event = String::new();
    let mut data: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = value.to_owned(),
            "data" => data.push(value),
            _ => {}
        }
    }
    if event.is_empty() && data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event: if event.is_empty() { "message".into() } else { event },
        data: data.join("\n"),
    })
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    path: String,
    #[serde(default)]
    data: Value,
}

/// A decoded database stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Put { path: String, data: Value },
    Patch { path: String, data: Value },
    KeepAlive,
    Cancel(String),
    AuthRevoked,
    Unknown(String),
}

impl StreamEvent {
    pub fn from_frame(frame: &SseFrame) -> Result<Self, StoreError> {
        Ok(match frame.event.as_str() {
            "put" => {
                let p: EventPayload = serde_json::from_str(&frame.data)?;
                Self::Put {
                    path: p.path,
                    data: p.data,
                }
            }
            "patch" => {
                let p: EventPayload = serde_json::from_str(&frame.data)?;
                Self::Patch {
                    path: p.path,
                    data: p.data,
                }
            }
            "keep-alive" => Self::KeepAlive,
            "cancel" => Self::Cancel(frame.data.clone()),
            "auth_revoked" => Self::AuthRevoked,
            other => Self::Unknown(other.to_owned()),
        })
    }

    /// Apply a data event to the cached value of the subscribed location.
    ///
    /// Returns `true` if the cache changed shape (i.e. a snapshot should be emitted).
    pub fn apply(&self, cache: &mut Value) -> bool {
        match self {
            Self::Put { path, data } => {
                tree::set_at(cache, &paths::segments(path), data.clone());
                true
            }
            Self::Patch { path, data } => {
                if let Value::Object(fields) = data {
                    tree::merge_at(cache, &paths::segments(path), fields);
                }
                true
            }
            _ => false,
        }
    }
}
