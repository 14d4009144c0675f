//! In-process [`Store`] with the same write and subscription semantics as
//! the Realtime Database.
//!
//! Every write is recorded as a [`StoreOp`], so tests can assert which
//! paths a flow touched and whether it used a full write or a merge.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StoreError;
use crate::paths;
use crate::store::Store;
use crate::subscription::{SnapshotSender, Subscription};
use crate::tree;

/// A recorded write.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Set { path: String, value: Value },
    Update { path: String, fields: Map<String, Value> },
}

impl StoreOp {
    pub fn path(&self) -> &str {
        match self {
            Self::Set { path, .. } | Self::Update { path, .. } => path,
        }
    }
}

#[derive(Default)]
struct Inner {
    root: Value,
    watchers: Vec<SnapshotSender>,
    ops: Vec<StoreOp>,
}

/// Shared, cloneable in-memory document tree.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing tree.
    pub fn with_root(root: Value) -> Self {
        let store = Self::new();
        store.lock().root = tree::normalize(root);
        store
    }

    /// A copy of the whole tree.
    pub fn dump(&self) -> Value {
        self.lock().root.clone()
    }

    /// Every write performed so far, oldest first.
    pub fn ops(&self) -> Vec<StoreOp> {
        self.lock().ops.clone()
    }

    /// Number of live subscriptions.
    pub fn watcher_count(&self) -> usize {
        let mut inner = self.lock();
        inner.watchers.retain(|w| !w.is_closed());
        inner.watchers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the tree half-written
        // (every mutation is a single assignment), so poisoning is ignored.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, path: &str, op: StoreOp, apply: impl FnOnce(&mut Value)) {
        let mut inner = self.lock();
        apply(&mut inner.root);
        inner.ops.push(op);

        let changed = paths::segments(path);
        let Inner { root, watchers, .. } = &mut *inner;
        watchers.retain(|w| {
            let watched = paths::segments(w.path());
            if !paths::overlaps(&watched, &changed) {
                return !w.is_closed();
            }
            w.send(tree::get_at(root, &watched).cloned())
        });
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        paths::validate_path(path)?;
        Ok(tree::get_at(&self.lock().root, &paths::segments(path)).cloned())
    }

    async fn set(&self, path: &str, value: &Value) -> Result<(), StoreError> {
        paths::validate_path(path)?;
        debug!(store = "memory", path, "set");
        let op = StoreOp::Set {
            path: path.to_owned(),
            value: value.clone(),
        };
        self.write(path, op, |root| {
            tree::set_at(root, &paths::segments(path), value.clone())
        });
        Ok(())
    }

    async fn update(&self, path: &str, fields: &Map<String, Value>) -> Result<(), StoreError> {
        paths::validate_path(path)?;
        for key in fields.keys() {
            paths::validate_path(key)?;
        }
        debug!(store = "memory", path, fields = fields.len(), "update");
        let op = StoreOp::Update {
            path: path.to_owned(),
            fields: fields.clone(),
        };
        self.write(path, op, |root| {
            tree::merge_at(root, &paths::segments(path), fields)
        });
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError> {
        paths::validate_path(path)?;
        let (sender, subscription) = Subscription::channel(paths::join("", path));
        let mut inner = self.lock();
        let current = tree::get_at(&inner.root, &paths::segments(path)).cloned();
        sender.send(current);
        inner.watchers.push(sender);
        Ok(subscription)
    }
}
