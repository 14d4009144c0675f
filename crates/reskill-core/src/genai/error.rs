use thiserror::Error;

/// Failures of a single generation request.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The service answered with a non-success status.
    #[error("Erro Gemini: {status} - {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("generation request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// A success status with a body that is not JSON.
    #[error("generation response is not valid JSON: {0}")]
    InvalidBody(#[source] reqwest::Error),

    /// The generator is not configured (e.g. no API key).
    #[error("generation is not configured: {0}")]
    NotConfigured(String),
}

impl GenerationError {
    /// HTTP status for [`GenerationError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
