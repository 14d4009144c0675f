//! Remote profile/plan store for reskill.
//!
//! Documents live in a path-addressed JSON tree (Firebase Realtime Database
//! layout): user profiles at `users/{uid}`, weekly plans at
//! `plans/{uid}/{weekId}`. The [`Store`] trait covers full-document writes,
//! partial merges and live subscriptions; [`RestStore`] talks to the real
//! database over REST and [`MemoryStore`] keeps the tree in process.

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod paths;
pub mod queries;
pub mod rest;
pub mod sse;
pub mod store;
pub mod subscription;
pub mod tree;

pub use config::StoreConfig;
pub use error::StoreError;
pub use memory::{MemoryStore, StoreOp};
pub use rest::RestStore;
pub use store::Store;
pub use subscription::{ListenerGuard, Snapshot, SnapshotSender, Subscription};
