//! Account identity: provider adapter, the session signal and the
//! sign-up / sign-in / sign-out flows.

pub mod firebase;
pub mod provider;
pub mod service;
pub mod session;

pub use firebase::{FirebaseAuth, IdentityConfig};
pub use provider::{AuthError, IdentityProvider};
pub use service::{AuthService, StoreFactory};
pub use session::{Session, SessionSignal, SessionState};
