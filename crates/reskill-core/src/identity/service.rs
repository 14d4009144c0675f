//! Sign-up, sign-in and sign-out flows.

use std::sync::Arc;

use tracing::info;

use reskill_store::Store;
use reskill_store::queries::profiles;

use super::provider::{AuthError, IdentityProvider};
use super::session::{Session, SessionSignal};

/// Builds a store authorized as the given user.
pub type StoreFactory = Arc<dyn Fn(&Session) -> Arc<dyn Store> + Send + Sync>;

/// Ties the identity provider, the profile store and the session signal.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    store_for: StoreFactory,
    signal: SessionSignal,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>, store_for: StoreFactory, signal: SessionSignal) -> Self {
        Self {
            provider,
            store_for,
            signal,
        }
    }

    pub fn signal(&self) -> &SessionSignal {
        &self.signal
    }

    /// Create an account and its default profile document.
    ///
    /// The new session is returned but not published: the user signs in
    /// explicitly afterwards.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.provider.create_account(email, password).await?;
        let store = (self.store_for)(&session);
        profiles::create_default_profile(store.as_ref(), &session.uid).await?;
        Ok(session)
    }

    /// Sign in and publish the session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        self.signal.set(session.clone());
        Ok(session)
    }

    /// Renew the signed-in user's ID token and publish the new session.
    /// `None` when nobody is signed in.
    pub async fn refresh(&self) -> Result<Option<Session>, AuthError> {
        let Some(current) = self.signal.current() else {
            return Ok(None);
        };
        let session = self.provider.refresh(&current).await?;
        info!(uid = %session.uid, "session refreshed");
        self.signal.set(session.clone());
        Ok(Some(session))
    }

    /// Clear the session. A no-op when nobody is signed in.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(session) = self.signal.current() {
            self.provider.sign_out(&session).await?;
            info!(uid = %session.uid, "signed out");
        }
        self.signal.clear();
        Ok(())
    }

    /// A store authorized as the signed-in user.
    pub fn store(&self) -> Option<Arc<dyn Store>> {
        self.signal.current().map(|session| (self.store_for)(&session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reskill_store::MemoryStore;
    use reskill_store::models::SkillLevel;
    use std::sync::Mutex;

    /// Accepts any password except "wrong"; remembers created emails.
    #[derive(Default)]
    struct LocalProvider {
        accounts: Mutex<Vec<String>>,
        signed_out: Mutex<Vec<String>>,
    }

    fn session_for(email: &str) -> Session {
        Session {
            uid: email.split('@').next().unwrap_or_default().to_string(),
            email: email.to_string(),
            id_token: "tok".into(),
            refresh_token: "ref".into(),
            expires_at: None,
        }
    }

    #[async_trait]
    impl IdentityProvider for LocalProvider {
        fn name(&self) -> &str {
            "local"
        }

        async fn create_account(&self, email: &str, _password: &str) -> Result<Session, AuthError> {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.iter().any(|a| a == email) {
                return Err(AuthError::Provider("EMAIL_EXISTS".into()));
            }
            accounts.push(email.to_string());
            Ok(session_for(email))
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            if password == "wrong" {
                return Err(AuthError::Provider("INVALID_PASSWORD".into()));
            }
            Ok(session_for(email))
        }

        async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
            if session.refresh_token != "ref" {
                return Err(AuthError::Provider("INVALID_REFRESH_TOKEN".into()));
            }
            Ok(Session {
                id_token: format!("{}-renewed", session.id_token),
                ..session.clone()
            })
        }

        async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
            self.signed_out.lock().unwrap().push(session.uid.clone());
            Ok(())
        }
    }

    fn service(store: MemoryStore) -> (AuthService, Arc<LocalProvider>) {
        let provider = Arc::new(LocalProvider::default());
        let factory: StoreFactory = Arc::new(move |_: &Session| Arc::new(store.clone()) as Arc<dyn Store>);
        let service = AuthService::new(provider.clone(), factory, SessionSignal::restored(None));
        (service, provider)
    }

    #[tokio::test]
    async fn sign_up_writes_default_profile_without_signing_in() {
        let store = MemoryStore::new();
        let (auth, _) = service(store.clone());
        let session = auth.sign_up("ana@example.com", "secret1").await.unwrap();
        assert_eq!(session.uid, "ana");
        assert!(auth.signal().current().is_none());

        let profile = profiles::get_profile(&store, "ana").await.unwrap().unwrap();
        assert_eq!(profile.current_skill_level, SkillLevel::Beginner);
        assert_eq!(profile.weekly_hours, 5);
    }

    #[tokio::test]
    async fn duplicate_sign_up_passes_provider_message() {
        let (auth, _) = service(MemoryStore::new());
        auth.sign_up("ana@example.com", "secret1").await.unwrap();
        let err = auth.sign_up("ana@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.to_string(), "EMAIL_EXISTS");
    }

    #[tokio::test]
    async fn sign_in_and_out_drive_the_signal() {
        let (auth, provider) = service(MemoryStore::new());
        assert!(auth.sign_in("bia@example.com", "wrong").await.is_err());
        assert!(auth.signal().current().is_none());

        auth.sign_in("bia@example.com", "ok").await.unwrap();
        assert_eq!(auth.signal().current().unwrap().uid, "bia");
        assert!(auth.store().is_some());

        auth.sign_out().await.unwrap();
        assert!(auth.signal().current().is_none());
        assert!(auth.store().is_none());
        assert_eq!(*provider.signed_out.lock().unwrap(), vec!["bia".to_string()]);
    }

    #[tokio::test]
    async fn refresh_publishes_the_renewed_session() {
        let (auth, _) = service(MemoryStore::new());
        assert!(auth.refresh().await.unwrap().is_none());

        auth.sign_in("caio@example.com", "ok").await.unwrap();
        let renewed = auth.refresh().await.unwrap().unwrap();
        assert_eq!(renewed.id_token, "tok-renewed");
        assert_eq!(auth.signal().current(), Some(renewed));

        auth.signal().set(Session {
            refresh_token: "revoked".into(),
            ..session_for("caio@example.com")
        });
        let err = auth.refresh().await.unwrap_err();
        assert_eq!(err.to_string(), "INVALID_REFRESH_TOKEN");
        assert_eq!(auth.signal().current().unwrap().refresh_token, "revoked");
    }
}
