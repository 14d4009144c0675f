//! Helpers for tests that touch process-wide environment variables.

use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;

use crate::config::{DATABASE_URL_ENV, FIREBASE_API_KEY_ENV, GEMINI_API_KEY_ENV, GEMINI_MODEL_ENV};

static ENV_LOCK: Mutex<()> = Mutex::new(());

const MANAGED_VARS: [&str; 5] = [
    "XDG_CONFIG_HOME",
    GEMINI_API_KEY_ENV,
    GEMINI_MODEL_ENV,
    FIREBASE_API_KEY_ENV,
    DATABASE_URL_ENV,
];

/// Serialize tests that read or write environment variables.
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds the env lock, points `XDG_CONFIG_HOME` at a fresh temp dir and
/// clears the `RESKILL_*` variables. Everything is restored on drop.
pub struct TempConfigHome {
    prior: Vec<(&'static str, Option<OsString>)>,
    _dir: TempDir,
    _lock: MutexGuard<'static, ()>,
}

impl TempConfigHome {
    pub fn new() -> Self {
        let lock = lock_env();
        let dir = TempDir::new().unwrap();
        let prior = MANAGED_VARS
            .iter()
            .map(|name| (*name, std::env::var_os(name)))
            .collect();

        for name in MANAGED_VARS {
            unsafe { std::env::remove_var(name) };
        }
        unsafe { std::env::set_var("XDG_CONFIG_HOME", dir.path()) };

        Self {
            prior,
            _dir: dir,
            _lock: lock,
        }
    }
}

impl Drop for TempConfigHome {
    fn drop(&mut self) {
        for (name, value) in &self.prior {
            match value {
                Some(v) => unsafe { std::env::set_var(name, v) },
                None => unsafe { std::env::remove_var(name) },
            }
        }
    }
}
