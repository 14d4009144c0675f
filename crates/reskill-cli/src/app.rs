//! Per-invocation context: resolved config, the store backend and the
//! session restored from disk.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::ValueEnum;
use serde_json::{Map, Value};
use tracing::debug;

use reskill_core::GeminiClient;
use reskill_core::identity::{AuthService, FirebaseAuth, Session, SessionSignal, StoreFactory};
use reskill_core::plan::error::NOT_SIGNED_IN_MESSAGE;
use reskill_store::models::UserProfile;
use reskill_store::{MemoryStore, RestStore, Store};

use crate::config::ReskillConfig;
use crate::session_file;

/// Where profile and plan documents are read and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StoreKind {
    /// The Realtime Database over REST.
    #[default]
    Rest,
    /// A throwaway in-process tree seeded with a default profile. Nothing
    /// is persisted.
    Memory,
}

pub struct App {
    config: ReskillConfig,
    store_kind: StoreKind,
    signal: SessionSignal,
}

impl App {
    pub fn new(config: ReskillConfig, store_kind: StoreKind) -> Result<Self> {
        let signal = SessionSignal::restored(session_file::load_session()?);
        Ok(Self {
            config,
            store_kind,
            signal,
        })
    }

    pub fn config(&self) -> &ReskillConfig {
        &self.config
    }

    pub fn signal(&self) -> &SessionSignal {
        &self.signal
    }

    /// The signed-in user, or an error telling them to sign in.
    pub fn session(&self) -> Result<Session> {
        self.signal
            .current()
            .ok_or_else(|| anyhow!("{NOT_SIGNED_IN_MESSAGE} Run `reskill signin` first."))
    }

    pub fn store_factory(&self) -> StoreFactory {
        match self.store_kind {
            StoreKind::Rest => {
                let config = self.config.store.clone();
                Arc::new(move |session: &Session| -> Arc<dyn Store> {
                    Arc::new(RestStore::new(config.clone()).with_auth(session.id_token.clone()))
                })
            }
            StoreKind::Memory => Arc::new(|session: &Session| -> Arc<dyn Store> {
                Arc::new(MemoryStore::with_root(seed_tree(&session.uid)))
            }),
        }
    }

    /// A store authorized as the signed-in user.
    ///
    /// The database only accepts a live ID token, so an expired one is
    /// renewed first and the renewed session saved.
    pub async fn store(&self) -> Result<Arc<dyn Store>> {
        let mut session = self.session()?;
        if self.store_kind == StoreKind::Rest && session.needs_refresh(Utc::now()) {
            session = self.refresh_session().await?;
        }
        Ok((self.store_factory())(&session))
    }

    async fn refresh_session(&self) -> Result<Session> {
        let session = self
            .auth()?
            .refresh()
            .await
            .context("the saved session expired and could not be renewed; run `reskill signin` again")?
            .ok_or_else(|| anyhow!("{NOT_SIGNED_IN_MESSAGE} Run `reskill signin` first."))?;
        session_file::save_session(&session)?;
        debug!(uid = %session.uid, "saved renewed session");
        Ok(session)
    }

    pub fn generator(&self) -> Result<GeminiClient> {
        let config = self.config.generation()?.clone();
        GeminiClient::new(config).context("failed to build generation client")
    }

    pub fn auth(&self) -> Result<AuthService> {
        let provider = FirebaseAuth::new(self.config.identity()?.clone())
            .context("failed to build identity client")?;
        Ok(AuthService::new(
            Arc::new(provider),
            self.store_factory(),
            self.signal.clone(),
        ))
    }
}

/// `{"users": {uid: <default profile>}}`.
fn seed_tree(uid: &str) -> Value {
    let profile = serde_json::to_value(UserProfile::default()).unwrap_or_default();
    let mut users = Map::new();
    users.insert(uid.to_string(), profile);
    let mut root = Map::new();
    root.insert("users".to_string(), Value::Object(users));
    Value::Object(root)
}
