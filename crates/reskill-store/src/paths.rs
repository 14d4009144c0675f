//! Document paths and key validation.
//!
//! Paths are `/`-separated keys relative to the database root. Keys may not
//! be empty or contain `.`, `$`, `#`, `[`, `]` or `/`.

use crate::error::StoreError;

pub const USERS_ROOT: &str = "users";
pub const PLANS_ROOT: &str = "plans";

const FORBIDDEN: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// Check a single path segment.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_owned(),
            reason: "key is empty",
        });
    }
    if key.contains(FORBIDDEN) {
        return Err(StoreError::InvalidKey {
            key: key.to_owned(),
            reason: "key contains one of . $ # [ ] /",
        });
    }
    if key.chars().any(char::is_control) {
        return Err(StoreError::InvalidKey {
            key: key.to_owned(),
            reason: "key contains control characters",
        });
    }
    Ok(())
}

/// `users/{uid}`
pub fn user_path(uid: &str) -> Result<String, StoreError> {
    validate_key(uid)?;
    Ok(format!("{USERS_ROOT}/{uid}"))
}

/// `plans/{uid}/{week_id}`
pub fn plan_path(uid: &str, week_id: &str) -> Result<String, StoreError> {
    validate_key(uid)?;
    validate_key(week_id)?;
    Ok(format!("{PLANS_ROOT}/{uid}/{week_id}"))
}

/// Append a child path (possibly multi-segment) to `base`.
pub fn join(base: &str, child: &str) -> String {
    let base = base.trim_matches('/');
    let child = child.trim_matches('/');
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child.to_owned(),
        (_, true) => base.to_owned(),
        _ => format!("{base}/{child}"),
    }
}

/// Split a path into its non-empty segments. The root is `[]`.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Validate every segment of a multi-segment path.
pub fn validate_path(path: &str) -> Result<(), StoreError> {
    segments(path).into_iter().try_for_each(validate_key)
}

/// Whether one path is equal to, above or below the other.
pub fn overlaps(a: &[&str], b: &[&str]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}
