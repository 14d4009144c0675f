//! Structured-response extraction: generated text to a typed value.
//!
//! Models often wrap JSON in a markdown code block. [`strip_fences`] removes
//! one leading fence (with its optional language tag) and one trailing
//! fence, and only at the ends of the text. Fence markers inside the payload
//! are left alone.

use serde::de::DeserializeOwned;
use thiserror::Error;

const FENCE: &str = "```";
const SNIPPET_CHARS: usize = 120;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("generated response is empty")]
    Empty,

    #[error("generated response is not the expected JSON ({source}): {snippet}")]
    Json {
        #[source]
        source: serde_json::Error,
        /// Start of the offending payload, for logs.
        snippet: String,
    },
}

/// Remove anchored markdown fences and surrounding whitespace.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = match rest.find('\n') {
            // The rest of the opening line is the language tag.
            Some(end) => &rest[end + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    text = text.trim_end();
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }

    text.trim()
}

/// Strip fences and parse the payload as `T`.
pub fn extract_json<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    let payload = strip_fences(raw);
    if payload.is_empty() {
        return Err(ExtractError::Empty);
    }
    serde_json::from_str(payload).map_err(|source| ExtractError::Json {
        source,
        snippet: payload.chars().take(SNIPPET_CHARS).collect(),
    })
}
