//! Integration tests for `FirebaseAuth` and `AuthService` against the fake
//! identity and database servers.

use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Client;

use reskill_core::identity::{
    AuthError, AuthService, FirebaseAuth, IdentityConfig, IdentityProvider, Session,
    SessionSignal, StoreFactory,
};
use reskill_store::models::UserProfile;
use reskill_store::queries::profiles;
use reskill_store::{RestStore, Store, StoreConfig, StoreError};
use reskill_test_utils::{FakeDatabase, FakeIdentity};

const API_KEY: &str = "web-key";

fn firebase(fake: &FakeIdentity) -> FirebaseAuth {
    let mut config = IdentityConfig::new(API_KEY);
    config.endpoint = fake.endpoint();
    config.token_endpoint = fake.token_endpoint();
    FirebaseAuth::new(config).unwrap()
}

fn rest_factory(db: &FakeDatabase) -> StoreFactory {
    let client = Client::new();
    let config = StoreConfig::new(db.url());
    Arc::new(move |session: &Session| {
        Arc::new(RestStore::with_client(client.clone(), config.clone()).with_auth(&session.id_token))
            as Arc<dyn Store>
    })
}

#[tokio::test]
async fn sign_up_then_sign_in() {
    let fake = FakeIdentity::start(API_KEY).await;
    let auth = firebase(&fake);

    let created = auth.create_account("ana@example.com", "segredo1").await.unwrap();
    assert_eq!(Some(created.uid.clone()), fake.uid_of("ana@example.com"));
    assert_eq!(created.id_token, FakeIdentity::token_for(&created.uid));

    let session = auth.sign_in("ana@example.com", "segredo1").await.unwrap();
    assert_eq!(session.uid, created.uid);
    assert_eq!(session.email, "ana@example.com");
    assert!(!session.needs_refresh(Utc::now()));
}

#[tokio::test]
async fn expired_token_is_refreshed_and_accepted_again() {
    let fake = FakeIdentity::start(API_KEY).await;
    let db = FakeDatabase::start().await;
    let auth = firebase(&fake);
    auth.create_account("ana@example.com", "segredo1").await.unwrap();
    let signed_in = auth.sign_in("ana@example.com", "segredo1").await.unwrap();
    let uid = signed_in.uid.clone();

    // The database has moved on to the next token; the saved one is stale.
    db.require_auth(FakeIdentity::refreshed_token_for(&uid));
    let stale = Session {
        expires_at: Some(Utc::now() - Duration::minutes(5)),
        ..signed_in
    };
    assert!(stale.needs_refresh(Utc::now()));
    let store = RestStore::new(StoreConfig::new(db.url())).with_auth(&stale.id_token);
    let err = profiles::get_profile(&store, &uid).await.unwrap_err();
    assert!(matches!(err, StoreError::Status { status: 401, .. }), "{err:?}");

    let service = AuthService::new(
        Arc::new(auth),
        rest_factory(&db),
        SessionSignal::restored(Some(stale)),
    );
    let fresh = service.refresh().await.unwrap().unwrap();
    assert_eq!(fresh.uid, uid);
    assert_eq!(fresh.email, "ana@example.com");
    assert_eq!(fresh.id_token, FakeIdentity::refreshed_token_for(&uid));
    assert!(!fresh.needs_refresh(Utc::now()));
    assert_eq!(fake.refresh_count(), 1);

    let store = service.store().unwrap();
    assert!(profiles::get_profile(store.as_ref(), &uid).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_refresh_token_is_a_provider_error() {
    let fake = FakeIdentity::start(API_KEY).await;
    let auth = firebase(&fake);
    let session = Session {
        uid: "ghost".into(),
        email: "ghost@example.com".into(),
        id_token: "old".into(),
        refresh_token: "refresh-ghost".into(),
        expires_at: None,
    };
    let err = auth.refresh(&session).await.unwrap_err();
    assert!(matches!(err, AuthError::Provider(ref m) if m == "INVALID_REFRESH_TOKEN"), "{err:?}");
    assert_eq!(fake.refresh_count(), 0);
}

#[tokio::test]
async fn provider_errors_pass_through() {
    let fake = FakeIdentity::start(API_KEY).await;
    let auth = firebase(&fake);
    auth.create_account("ana@example.com", "segredo1").await.unwrap();

    let cases = [
        (auth.create_account("ana@example.com", "segredo1").await, "EMAIL_EXISTS"),
        (
            auth.create_account("bia@example.com", "123").await,
            "WEAK_PASSWORD : Password should be at least 6 characters",
        ),
        (auth.sign_in("ana@example.com", "errada1").await, "INVALID_PASSWORD"),
        (auth.sign_in("caio@example.com", "segredo1").await, "EMAIL_NOT_FOUND"),
        (auth.sign_in("sem-arroba", "segredo1").await, "INVALID_EMAIL"),
    ];
    for (result, expected) in cases {
        match result {
            Err(AuthError::Provider(message)) => assert_eq!(message, expected),
            other => panic!("expected provider error {expected}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn wrong_api_key_is_a_provider_error() {
    let fake = FakeIdentity::start(API_KEY).await;
    let mut config = IdentityConfig::new("other-key");
    config.endpoint = fake.endpoint();
    let err = FirebaseAuth::new(config)
        .unwrap()
        .sign_in("ana@example.com", "segredo1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Provider(m) if m.starts_with("API key not valid")));
}

#[tokio::test]
async fn auth_service_writes_profile_with_the_new_users_token() {
    let fake = FakeIdentity::start(API_KEY).await;
    let db = FakeDatabase::start().await;
    let service = AuthService::new(
        Arc::new(firebase(&fake)),
        rest_factory(&db),
        SessionSignal::restored(None),
    );

    let session = service.sign_up("dani@example.com", "segredo1").await.unwrap();
    assert!(service.signal().current().is_none());

    let request = db.requests().pop().unwrap();
    assert_eq!(request.path, format!("users/{}", session.uid));
    assert_eq!(request.auth(), Some(session.id_token.as_str()));

    let profile = profiles::get_profile(db.store(), &session.uid).await.unwrap();
    assert_eq!(profile, Some(UserProfile::default()));

    service.sign_in("dani@example.com", "segredo1").await.unwrap();
    assert_eq!(service.signal().current().unwrap().uid, session.uid);
    assert!(service.store().is_some());

    service.sign_out().await.unwrap();
    assert!(service.signal().current().is_none());
}
