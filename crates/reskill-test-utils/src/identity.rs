//! Fake Identity Toolkit (`accounts:signUp`, `accounts:signInWithPassword`)
//! and secure-token exchange (`token` with `grant_type=refresh_token`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Form, Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::Served;

const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    password: String,
}

#[derive(Clone)]
struct IdentityState {
    api_key: String,
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    refreshes: Arc<AtomicUsize>,
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub struct FakeIdentity {
    served: Served,
    state: IdentityState,
}

impl FakeIdentity {
    pub async fn start(api_key: impl Into<String>) -> Self {
        let state = IdentityState {
            api_key: api_key.into(),
            accounts: Arc::default(),
            refreshes: Arc::default(),
        };
        let router = Router::new()
            .route("/v1/{action}", post(handle))
            .route("/secure/v1/token", post(refresh))
            .with_state(state.clone());
        Self {
            served: Served::start(router).await,
            state,
        }
    }

    /// API root to configure the client with.
    pub fn endpoint(&self) -> String {
        format!("{}/v1", self.served.url())
    }

    /// Secure-token API root to configure the client with.
    pub fn token_endpoint(&self) -> String {
        format!("{}/secure/v1", self.served.url())
    }

    /// The ID token issued to `uid` at sign-up and sign-in.
    pub fn token_for(uid: &str) -> String {
        format!("id-token-{uid}")
    }

    /// The ID token issued to `uid` by a refresh.
    pub fn refreshed_token_for(uid: &str) -> String {
        format!("id-token-{uid}-refreshed")
    }

    /// The refresh token issued to `uid`.
    pub fn refresh_token_for(uid: &str) -> String {
        format!("refresh-{uid}")
    }

    /// How many token refreshes were granted.
    pub fn refresh_count(&self) -> usize {
        self.state.refreshes.load(Ordering::SeqCst)
    }

    /// The uid of a registered email.
    pub fn uid_of(&self, email: &str) -> Option<String> {
        self.state
            .accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|a| a.uid.clone())
    }
}

fn provider_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": {
                "code": 400,
                "message": message,
                "errors": [{ "message": message, "domain": "global", "reason": "invalid" }]
            }
        })),
    )
        .into_response()
}

fn session(uid: &str, email: &str) -> Response {
    Json(json!({
        "kind": "identitytoolkit#VerifyPasswordResponse",
        "localId": uid,
        "email": email,
        "idToken": FakeIdentity::token_for(uid),
        "refreshToken": FakeIdentity::refresh_token_for(uid),
        "expiresIn": "3600"
    }))
    .into_response()
}

async fn handle(
    State(state): State<IdentityState>,
    Path(action): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(credentials): Json<Credentials>,
) -> Response {
    if query.get("key") != Some(&state.api_key) {
        return provider_error("API key not valid. Please pass a valid API key.");
    }
    let email = credentials.email.trim().to_lowercase();
    if email.is_empty() {
        return provider_error("MISSING_EMAIL");
    }
    if !email.contains('@') {
        return provider_error("INVALID_EMAIL");
    }
    if credentials.password.is_empty() {
        return provider_error("MISSING_PASSWORD");
    }

    let mut accounts = state.accounts.lock().unwrap();
    match action.as_str() {
        "accounts:signUp" => {
            if accounts.contains_key(&email) {
                return provider_error("EMAIL_EXISTS");
            }
            if credentials.password.chars().count() < MIN_PASSWORD_CHARS {
                return provider_error("WEAK_PASSWORD : Password should be at least 6 characters");
            }
            let uid = Uuid::new_v4().simple().to_string();
            accounts.insert(
                email.clone(),
                Account {
                    uid: uid.clone(),
                    password: credentials.password,
                },
            );
            session(&uid, &email)
        }
        "accounts:signInWithPassword" => match accounts.get(&email) {
            None => provider_error("EMAIL_NOT_FOUND"),
            Some(account) if account.password != credentials.password => {
                provider_error("INVALID_PASSWORD")
            }
            Some(account) => session(&account.uid, &email),
        },
        _ => (StatusCode::NOT_FOUND, "unknown action").into_response(),
    }
}

async fn refresh(
    State(state): State<IdentityState>,
    Query(query): Query<HashMap<String, String>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if query.get("key") != Some(&state.api_key) {
        return provider_error("API key not valid. Please pass a valid API key.");
    }
    if form.get("grant_type").map(String::as_str) != Some("refresh_token") {
        return provider_error("INVALID_GRANT_TYPE");
    }
    let Some(token) = form.get("refresh_token").filter(|t| !t.is_empty()) else {
        return provider_error("MISSING_REFRESH_TOKEN");
    };

    let known = state
        .accounts
        .lock()
        .unwrap()
        .values()
        .find(|a| FakeIdentity::refresh_token_for(&a.uid) == *token)
        .map(|a| a.uid.clone());
    let Some(uid) = known else {
        return provider_error("INVALID_REFRESH_TOKEN");
    };

    state.refreshes.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "expires_in": "3600",
        "token_type": "Bearer",
        "refresh_token": FakeIdentity::refresh_token_for(&uid),
        "id_token": FakeIdentity::refreshed_token_for(&uid),
        "user_id": uid,
        "project_id": "reskill-test"
    }))
    .into_response()
}
