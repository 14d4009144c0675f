//! The `IdentityProvider` trait.

use async_trait::async_trait;
use thiserror::Error;

use reskill_store::StoreError;

use super::session::Session;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider refused the request; the message is passed through
    /// verbatim (e.g. `EMAIL_EXISTS`, `INVALID_PASSWORD`).
    #[error("{0}")]
    Provider(String),

    #[error("identity service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("identity request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The account exists but its profile document could not be written.
    #[error("failed to create profile: {0}")]
    Profile(#[from] StoreError),

    #[error("identity is not configured: {0}")]
    NotConfigured(String),
}

/// Email/password account operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn create_account(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Exchange `session`'s refresh token for a new ID token.
    async fn refresh(&self, session: &Session) -> Result<Session, AuthError>;

    /// Revoke provider-side state for `session`, if the provider keeps any.
    async fn sign_out(&self, _session: &Session) -> Result<(), AuthError> {
        Ok(())
    }
}

// Compile-time assertion: IdentityProvider must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn IdentityProvider) {}
};
