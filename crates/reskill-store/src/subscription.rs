//! Live subscriptions to a store path.
//!
//! A [`Subscription`] yields the full value at its path after every change.
//! It owns a [`CancellationToken`]: `stop()` (or dropping the subscription)
//! releases it, and no value is delivered after that point even if one was
//! already queued.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

/// The value at a subscribed path at one point in time. `None` means absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: String,
    pub value: Option<Value>,
}

impl Snapshot {
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// Decode the value into a typed document. Absent values decode to `None`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        match &self.value {
            None => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|source| StoreError::Shape {
                    path: self.path.clone(),
                    source,
                }),
        }
    }
}

/// Producer side of a subscription, held by the store's background task.
#[derive(Debug, Clone)]
pub struct SnapshotSender {
    path: String,
    tx: mpsc::UnboundedSender<Snapshot>,
    cancel: CancellationToken,
}

impl SnapshotSender {
    /// Queue a snapshot. Returns `false` once the subscriber has gone away.
    pub fn send(&self, value: Option<Value>) -> bool {
        if self.is_closed() {
            return false;
        }
        self.tx
            .send(Snapshot {
                path: self.path.clone(),
                value,
            })
            .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves when the subscriber stops or drops its subscription.
    pub async fn closed(&self) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = self.tx.closed() => {}
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Consumer side of a live subscription.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    rx: mpsc::UnboundedReceiver<Snapshot>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Create a connected sender/subscription pair for `path`.
    pub fn channel(path: impl Into<String>) -> (SnapshotSender, Subscription) {
        let path = path.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let sender = SnapshotSender {
            path: path.clone(),
            tx,
            cancel: cancel.clone(),
        };
        (sender, Subscription { path, rx, cancel })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Release the subscription. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the subscription has been stopped or the store
    /// closed the stream.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let snapshot = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            s = self.rx.recv() => s,
        };
        // A stop that raced with delivery wins.
        if self.cancel.is_cancelled() {
            return None;
        }
        if snapshot.is_none() {
            // The store closed the stream.
            self.cancel.cancel();
        }
        snapshot
    }

    /// Hand every snapshot to `callback` on a background task.
    ///
    /// The returned guard stops the subscription when stopped or dropped;
    /// the callback is never invoked after that.
    pub fn listen<F>(mut self, mut callback: F) -> ListenerGuard
    where
        F: FnMut(Snapshot) + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let task = tokio::spawn(async move {
            while let Some(snapshot) = self.next().await {
                callback(snapshot);
            }
        });
        ListenerGuard {
            cancel,
            task: Some(task),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Keeps a [`Subscription::listen`] callback alive.
#[derive(Debug)]
pub struct ListenerGuard {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ListenerGuard {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop and wait for the listener task to wind down.
    pub async fn stop_and_wait(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
