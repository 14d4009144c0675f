//! The saved sign-in, `session.toml` next to the config file.
//!
//! Written by `reskill signin`, removed by `reskill signout`, and read at
//! launch to seed the session signal.

use std::path::PathBuf;

use anyhow::{Context, Result};

use reskill_core::identity::Session;

use crate::config::{config_dir, write_private};

pub fn session_path() -> PathBuf {
    config_dir().join("session.toml")
}

/// The saved session, or `None` when nobody is signed in.
pub fn load_session() -> Result<Option<Session>> {
    let path = session_path();
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read session file at {}", path.display()))?;
    let session = toml::from_str(&contents).with_context(|| {
        format!(
            "failed to parse session file at {}; run `reskill signout` and sign in again",
            path.display()
        )
    })?;
    Ok(Some(session))
}

pub fn save_session(session: &Session) -> Result<()> {
    let contents = toml::to_string_pretty(session).context("failed to serialize session")?;
    write_private(&session_path(), &contents)
}

/// Remove the saved session. Returns whether one existed.
pub fn clear_session() -> Result<bool> {
    let path = session_path();
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            Err(e).with_context(|| format!("failed to remove session file at {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TempConfigHome;

    fn session() -> Session {
        Session {
            uid: "u1".into(),
            email: "ana@example.com".into(),
            id_token: "id-token-u1".into(),
            refresh_token: "refresh-u1".into(),
            expires_at: "2025-03-10T12:00:00Z".parse().ok(),
        }
    }

    #[test]
    fn save_load_clear() {
        let _home = TempConfigHome::new();
        assert!(load_session().unwrap().is_none());

        save_session(&session()).unwrap();
        assert_eq!(load_session().unwrap(), Some(session()));

        assert!(clear_session().unwrap());
        assert!(load_session().unwrap().is_none());
        assert!(!clear_session().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let _home = TempConfigHome::new();
        save_session(&session()).unwrap();
        let meta = std::fs::metadata(session_path()).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn corrupt_session_file_is_an_error() {
        let _home = TempConfigHome::new();
        write_private(&session_path(), "uid = ").unwrap();
        let err = load_session().unwrap_err();
        assert!(format!("{err:#}").contains("reskill signout"));
    }
}
