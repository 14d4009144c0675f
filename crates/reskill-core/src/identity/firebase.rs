//! Identity Toolkit REST client (`accounts:signUp`,
//! `accounts:signInWithPassword`) plus the secure-token exchange that
//! renews ID tokens.

use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::provider::{AuthError, IdentityProvider};
use super::session::Session;

#[derive(Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// API root, e.g. `https://identitytoolkit.googleapis.com/v1`.
    pub endpoint: String,
    /// Secure-token API root, e.g. `https://securetoken.googleapis.com/v1`.
    pub token_endpoint: String,
    pub api_key: String,
}

impl IdentityConfig {
    pub const DEFAULT_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";
    pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com/v1";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            token_endpoint: Self::DEFAULT_TOKEN_ENDPOINT.to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, action: &str) -> String {
        format!("{}/accounts:{action}", self.endpoint.trim_end_matches('/'))
    }

    fn token_url(&self) -> String {
        format!("{}/token", self.token_endpoint.trim_end_matches('/'))
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("endpoint", &self.endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

/// The secure-token API answers in snake_case.
#[derive(Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`IdentityProvider`] backed by Firebase Authentication.
#[derive(Debug, Clone)]
pub struct FirebaseAuth {
    http: Client,
    config: IdentityConfig,
}

impl FirebaseAuth {
    pub fn new(config: IdentityConfig) -> Result<Self, AuthError> {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: IdentityConfig) -> Result<Self, AuthError> {
        if config.api_key.trim().is_empty() {
            return Err(AuthError::NotConfigured("missing identity API key".to_string()));
        }
        Ok(Self { http, config })
    }

    async fn call(&self, action: &str, email: &str, password: &str) -> Result<Session, AuthError> {
        let url = self.config.url(action);
        debug!(%url, "identity request");
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&Credentials {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let account: AccountResponse = read_response(response).await?;
        Ok(Session {
            uid: account.local_id,
            email: if account.email.is_empty() {
                email.to_string()
            } else {
                account.email
            },
            id_token: account.id_token,
            refresh_token: account.refresh_token,
            expires_at: account
                .expires_in
                .and_then(|secs| Session::expiry_from(Utc::now(), &secs)),
        })
    }
}

/// Decode a success body, or turn the provider's error envelope into
/// [`AuthError::Provider`].
async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AuthError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => AuthError::Provider(envelope.error.message),
            Err(_) => AuthError::Status {
                status: status.as_u16(),
                body,
            },
        });
    }
    serde_json::from_str(&body).map_err(|_| AuthError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.call("signUp", email, password).await?;
        info!(uid = %session.uid, "account created");
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.call("signInWithPassword", email, password).await?;
        info!(uid = %session.uid, "signed in");
        Ok(session)
    }

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let url = self.config.token_url();
        debug!(%url, uid = %session.uid, "token refresh");
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .form(&RefreshGrant {
                grant_type: "refresh_token",
                refresh_token: &session.refresh_token,
            })
            .send()
            .await?;

        let token: TokenResponse = read_response(response).await?;
        if let Some(user_id) = token.user_id.as_deref().filter(|id| *id != session.uid) {
            return Err(AuthError::Provider(format!(
                "refreshed token belongs to {user_id}, not {}",
                session.uid
            )));
        }
        info!(uid = %session.uid, "token refreshed");
        Ok(Session {
            uid: session.uid.clone(),
            email: session.email.clone(),
            id_token: token.id_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .and_then(|secs| Session::expiry_from(Utc::now(), &secs)),
        })
    }
}
