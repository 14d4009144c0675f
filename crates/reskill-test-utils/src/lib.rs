//! Shared test utilities for reskill integration tests.
//!
//! In-process fakes of the remote services, each an axum router bound to
//! `127.0.0.1:0`:
//! - [`FakeGemini`]: `generateContent` with scripted replies,
//! - [`FakeDatabase`]: Realtime Database REST (GET/PUT/PATCH and the
//!   event stream) over a [`reskill_store::MemoryStore`],
//! - [`FakeIdentity`]: Identity Toolkit sign-up and sign-in, and token refresh.
//!
//! Plus [`ScriptedGenerator`] for tests that do not need HTTP at all.

mod database;
mod gemini;
mod generator;
mod identity;

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub use database::FakeDatabase;
pub use gemini::{FakeGemini, GeminiReply, RecordedGeneration};
pub use generator::ScriptedGenerator;
pub use identity::FakeIdentity;

/// A router served on an ephemeral local port. The server stops on drop.
#[derive(Debug)]
struct Served {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl Served {
    async fn start(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake server");
        let addr = listener.local_addr().expect("failed to read local address");
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("fake server failed");
        });
        Self { addr, task }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for Served {
    fn drop(&mut self) {
        self.task.abort();
    }
}
