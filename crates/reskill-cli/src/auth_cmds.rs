//! Account commands.
//!
//! - `reskill signup`  -- create an account and its default profile
//! - `reskill signin`  -- sign in and save the session
//! - `reskill signout` -- forget the saved session
//! - `reskill whoami`  -- show the saved session

use anyhow::{Context, Result};
use tracing::debug;

use reskill_core::identity::SessionState;

use crate::app::App;
use crate::session_file;

pub async fn cmd_signup(app: &App, email: &str, password: &str) -> Result<()> {
    let auth = app.auth()?;
    let session = auth
        .sign_up(email, password)
        .await
        .context("sign-up failed")?;

    println!("Account created for {}.", session.email);
    println!("  uid: {}", session.uid);
    println!();
    println!("Next: run `reskill signin --email {} --password ...`.", session.email);
    Ok(())
}

pub async fn cmd_signin(app: &App, email: &str, password: &str) -> Result<()> {
    let auth = app.auth()?;
    let session = auth
        .sign_in(email, password)
        .await
        .context("sign-in failed")?;
    session_file::save_session(&session)?;

    println!("Signed in as {} ({}).", session.email, session.uid);
    Ok(())
}

/// Forget the local session first; the provider is only told when
/// identity is configured.
pub async fn cmd_signout(app: &App) -> Result<()> {
    let had_session = session_file::clear_session()?;
    if app.signal().current().is_some() {
        match app.auth() {
            Ok(auth) => auth.sign_out().await.context("sign-out failed")?,
            Err(e) => debug!(error = %e, "identity not configured, skipping provider sign-out"),
        }
    }
    if had_session {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

pub fn cmd_whoami(app: &App) -> Result<()> {
    match app.signal().state() {
        SessionState::SignedIn(session) => {
            println!("{} ({})", session.email, session.uid);
            println!("  database: {}", app.config().store.base_url());
        }
        SessionState::SignedOut | SessionState::Loading => println!("Not signed in."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::StoreKind;
    use crate::config::ReskillConfig;
    use crate::test_util::TempConfigHome;
    use reskill_core::identity::Session;

    #[tokio::test]
    async fn signout_works_without_identity_config() {
        let _home = TempConfigHome::new();
        session_file::save_session(&Session {
            uid: "u1".into(),
            email: "ana@example.com".into(),
            id_token: "tok".into(),
            refresh_token: "r".into(),
            expires_at: None,
        })
        .unwrap();
        let app = App::new(ReskillConfig::resolve(None).unwrap(), StoreKind::Rest).unwrap();
        assert!(app.auth().is_err());

        cmd_signout(&app).await.unwrap();
        assert!(session_file::load_session().unwrap().is_none());

        // Idempotent.
        cmd_signout(&app).await.unwrap();
    }
}
