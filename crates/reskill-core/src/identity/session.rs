//! The signed-in session and the signal observers watch for it.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An authenticated user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    /// When `id_token` stops being accepted. Unknown for sessions saved
    /// before expiry was tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Expiry from the provider's `expiresIn` seconds, counted from `now`.
    pub fn expiry_from(now: DateTime<Utc>, expires_in: &str) -> Option<DateTime<Utc>> {
        let secs = expires_in.trim().parse::<i64>().ok()?;
        now.checked_add_signed(Duration::seconds(secs))
    }

    /// Whether `id_token` should be exchanged before talking to the store.
    /// A session with unknown expiry always needs it.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_none_or(|at| at - Duration::seconds(EXPIRY_MARGIN_SECS) <= now)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What the app knows about the current user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Startup: a stored session has not been looked at yet.
    #[default]
    Loading,
    SignedOut,
    SignedIn(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) => Some(session),
            _ => None,
        }
    }
}

/// Shared, observable current-user state.
///
/// Created once at launch and passed to whatever needs it. Cloning shares
/// the same underlying state.
#[derive(Debug, Clone)]
pub struct SessionSignal {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSignal {
    /// A signal in the [`SessionState::Loading`] state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Loading);
        Self { tx: Arc::new(tx) }
    }

    /// A signal already resolved from a restored session (or none).
    pub fn restored(session: Option<Session>) -> Self {
        let signal = Self::new();
        signal.resolve(session);
        signal
    }

    /// Leave the loading state with the restored session, if any.
    pub fn resolve(&self, session: Option<Session>) {
        self.tx.send_replace(match session {
            Some(session) => SessionState::SignedIn(session),
            None => SessionState::SignedOut,
        });
    }

    pub fn set(&self, session: Session) {
        self.tx.send_replace(SessionState::SignedIn(session));
    }

    pub fn clear(&self) {
        self.tx.send_replace(SessionState::SignedOut);
    }

    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().session().cloned()
    }

    /// Observe changes. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Wait until the state is no longer [`SessionState::Loading`].
    pub async fn resolved(&self) -> SessionState {
        let mut rx = self.tx.subscribe();
        match rx
            .wait_for(|state| !matches!(state, SessionState::Loading))
            .await
        {
            Ok(state) => state.clone(),
            // Unreachable while `self` holds the sender.
            Err(_) => SessionState::SignedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(uid: &str) -> Session {
        Session {
            uid: uid.into(),
            email: format!("{uid}@example.com"),
            id_token: "id-secret".into(),
            refresh_token: "refresh-secret".into(),
            expires_at: None,
        }
    }

    #[test]
    fn refresh_is_due_near_expiry() {
        let now = Utc::now();
        let mut s = session("u1");
        assert!(s.needs_refresh(now));

        s.expires_at = Session::expiry_from(now, "3600");
        assert!(!s.needs_refresh(now));
        assert!(s.needs_refresh(now + Duration::seconds(3550)));
        assert!(Session::expiry_from(now, "soon").is_none());
    }

    #[test]
    fn lifecycle() {
        let signal = SessionSignal::new();
        assert_eq!(signal.state(), SessionState::Loading);
        signal.resolve(None);
        assert_eq!(signal.state(), SessionState::SignedOut);
        signal.set(session("u1"));
        assert_eq!(signal.current().unwrap().uid, "u1");
        signal.clear();
        assert!(signal.current().is_none());
    }

    #[tokio::test]
    async fn observers_see_changes() {
        let signal = SessionSignal::restored(None);
        let mut rx = signal.subscribe();
        let observer = signal.clone();
        observer.set(session("u2"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().session().unwrap().uid, "u2");
    }

    #[tokio::test]
    async fn resolved_waits_for_restore() {
        let signal = SessionSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.resolved().await })
        };
        signal.resolve(Some(session("u3")));
        let state = waiter.await.unwrap();
        assert_eq!(state.session().unwrap().uid, "u3");
    }

    #[test]
    fn debug_hides_tokens() {
        let shown = format!("{:?}", session("u1"));
        assert!(!shown.contains("secret"));
        assert!(shown.contains("<redacted>"));
    }
}
