//! The `Store` trait -- the adapter interface for the remote document tree.
//!
//! Each backend ([`crate::RestStore`], [`crate::MemoryStore`]) implements
//! this trait. It is object-safe so callers can hold `&dyn Store` or
//! `Arc<dyn Store>` and swap backends at runtime.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::subscription::Subscription;

/// Path-addressed JSON document store.
///
/// Paths are `/`-separated keys relative to the root (see [`crate::paths`]).
/// There are no transactions: `update` is a merge, not a compare-and-swap.
#[async_trait]
pub trait Store: Send + Sync {
    /// Human-readable backend name (e.g. "rest", "memory").
    fn name(&self) -> &str;

    /// Read the value at `path` once. `None` if nothing is stored there.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the whole document at `path`.
    async fn set(&self, path: &str, value: &Value) -> Result<(), StoreError>;

    /// Merge the named children into the document at `path`, leaving other
    /// children untouched. Keys may be multi-segment child paths.
    async fn update(&self, path: &str, fields: &Map<String, Value>) -> Result<(), StoreError>;

    /// Start a live subscription to `path`.
    ///
    /// The first snapshot carries the current value; every later change at,
    /// above or below `path` (including this client's own writes) yields a
    /// new snapshot with the full value at `path`.
    async fn subscribe(&self, path: &str) -> Result<Subscription, StoreError>;
}

// Compile-time assertion: Store must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Store) {}
};
