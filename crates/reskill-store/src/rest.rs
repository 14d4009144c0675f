//! Realtime Database REST backend.
//!
//! - `GET {url}/{path}.json` reads a value,
//! - `PUT` replaces it, `PATCH` merges children,
//! - a `GET` with `Accept: text/event-stream` streams `put`/`patch` events,
//!   which are folded into a local copy of the subscribed value.
//!
//! Requests carry the signed-in user's ID token as the `auth` query parameter.

use std::fmt;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::paths;
use crate::sse::{SseDecoder, StreamEvent};
use crate::store::Store;
use crate::subscription::{SnapshotSender, Subscription};

/// [`Store`] backed by the Realtime Database REST API.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    config: StoreConfig,
    auth: Option<String>,
}

impl fmt::Debug for RestStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestStore")
            .field("database_url", &self.config.database_url)
            .field("auth", &self.auth.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: StoreConfig) -> Self {
        Self {
            client,
            config,
            auth: None,
        }
    }

    /// Authenticate requests with a user's ID token.
    pub fn with_auth(mut self, id_token: impl Into<String>) -> Self {
        self.auth = Some(id_token.into());
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// `{database_url}/{path}.json`, keeping any query string on the base URL
    /// (the emulator needs `?ns=<namespace>`).
    fn url(&self, path: &str) -> String {
        let base = self.config.base_url();
        let (root, query) = match base.split_once('?') {
            Some((root, query)) => (root.trim_end_matches('/'), Some(query)),
            None => (base, None),
        };
        let path = path.trim_matches('/');
        let mut url = if path.is_empty() {
            format!("{root}/.json")
        } else {
            format!("{root}/{path}.json")
        };
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(token) => request.query(&[("auth", token.as_str())]),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Store for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        paths::validate_path(path)?;
        let url = self.url(path);
        debug!(%url, "store get");
        let response = self.authorize(self.client.get(&url)).send().await?;
        let value: Value = Self::check(response).await?.json().await?;
        Ok(match value {
            Value::Null => None,
            other => Some(other),
        })
    }

    async fn set(&self, path: &str, value: &Value) -> Result<(), StoreError> {
        paths::validate_path(path)?;
        let url = self.url(path);
        info!(%url, "store set");
        let request = self
            .authorize(self.client.put(&url))
            .query(&[("print", "silent")])
            .json(value);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: &Map<String, Value>) -> Result<(), StoreError> {
        paths::validate_path(path)?;
        for key in fields.keys() {
            paths::validate_path(key)?;
        }
        let url = self.url(path);
        info!(%url, fields = fields.len(), "store update");
        let request = self
            .authorize(self.client.patch(&url))
            .query(&[("print", "silent")])
            .json(fields);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        paths::validate_path(path)?;
        let url = self.url(path);
        debug!(%url, "store subscribe");
        let response = self
            .authorize(self.client.get(&url))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = Self::check(response).await?;

        let (sender, subscription) = Subscription::channel(paths::join("", path));
        tokio::spawn(pump_events(response, sender));
        Ok(subscription)
    }
}

/// Read the event stream until it ends or the subscriber goes away.
async fn pump_events(response: Response, sender: SnapshotSender) {
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut cache = Value::Null;

    loop {
        let chunk = tokio::select! {
            _ = sender.closed() => {
                debug!(path = sender.path(), "subscription released");
                return;
            }
            chunk = body.next() => chunk,
        };
        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                warn!(path = sender.path(), error = %e, "event stream failed");
                return;
            }
            None => {
                debug!(path = sender.path(), "event stream ended");
                return;
            }
        };

        for frame in decoder.push(&bytes) {
            let event = match StreamEvent::from_frame(&frame) {
                Ok(event) => event,
                Err(e) => {
                    warn!(path = sender.path(), error = %e, "skipping malformed event");
                    continue;
                }
            };
            match &event {
                StreamEvent::Cancel(reason) => {
                    warn!(path = sender.path(), %reason, "subscription cancelled by server");
                    return;
                }
                StreamEvent::AuthRevoked => {
                    warn!(path = sender.path(), "subscription auth revoked");
                    return;
                }
                _ => {}
            }
            if event.apply(&mut cache) {
                let value = (!cache.is_null()).then(|| cache.clone());
                if !sender.send(value) {
                    return;
                }
            }
        }
    }
}
