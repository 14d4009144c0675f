use thiserror::Error;

/// Errors from store reads, writes and subscriptions.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON from store: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("document at {path:?} does not match the expected shape: {source}")]
    Shape {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("subscription to {0:?} was closed by the server")]
    Closed(String),
}
