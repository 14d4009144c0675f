//! Profile documents at `users/{uid}`.

use tracing::info;

use crate::error::StoreError;
use crate::models::{ProfilePatch, UserProfile};
use crate::paths;
use crate::store::Store;
use crate::subscription::Subscription;

use super::decode;

/// Write the default profile for a freshly created account. Returns it.
pub async fn create_default_profile(store: &dyn Store, uid: &str) -> Result<UserProfile, StoreError> {
    let profile = UserProfile::default();
    save_profile(store, uid, &profile).await?;
    info!(uid, "default profile created");
    Ok(profile)
}

/// Fetch a profile. Missing fields fall back to the defaults.
pub async fn get_profile(store: &dyn Store, uid: &str) -> Result<Option<UserProfile>, StoreError> {
    let path = paths::user_path(uid)?;
    match store.get(&path).await? {
        Some(value) => decode(&path, value).map(Some),
        None => Ok(None),
    }
}

/// Replace the whole profile document.
pub async fn save_profile(store: &dyn Store, uid: &str, profile: &UserProfile) -> Result<(), StoreError> {
    let path = paths::user_path(uid)?;
    store.set(&path, &serde_json::to_value(profile)?).await
}

/// Merge only the fields set in `patch`. An empty patch is a no-op.
pub async fn merge_profile(store: &dyn Store, uid: &str, patch: &ProfilePatch) -> Result<(), StoreError> {
    let path = paths::user_path(uid)?;
    if patch.is_empty() {
        return Ok(());
    }
    store.update(&path, &patch.to_fields()).await
}

/// Live view of the profile document.
pub async fn watch_profile(store: &dyn Store, uid: &str) -> Result<Subscription, StoreError> {
    let path = paths::user_path(uid)?;
    store.subscribe(&path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::{InterestArea, SkillLevel};
    use serde_json::json;

    #[tokio::test]
    async fn default_profile_roundtrip() {
        let store = MemoryStore::new();
        let created = create_default_profile(&store, "u1").await.unwrap();
        let loaded = get_profile(&store, "u1").await.unwrap().unwrap();
        assert_eq!(created, loaded);
        assert_eq!(
            store.dump()["users"]["u1"]["currentSkillLevel"],
            json!("iniciante")
        );
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let store = MemoryStore::new();
        assert!(get_profile(&store, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn merge_leaves_other_fields() {
        let store = MemoryStore::new();
        let mut profile = UserProfile::default();
        profile.name = "Ana".into();
        save_profile(&store, "u1", &profile).await.unwrap();

        let patch = ProfilePatch {
            current_skill_level: Some(SkillLevel::Intermediate),
            interest_area: Some(Some(InterestArea::Backend)),
            ..Default::default()
        };
        merge_profile(&store, "u1", &patch).await.unwrap();

        let loaded = get_profile(&store, "u1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Ana");
        assert_eq!(loaded.current_skill_level, SkillLevel::Intermediate);
        assert_eq!(loaded.interest_area, Some(InterestArea::Backend));
    }

    #[tokio::test]
    async fn empty_patch_writes_nothing() {
        let store = MemoryStore::new();
        merge_profile(&store, "u1", &ProfilePatch::default()).await.unwrap();
        assert!(store.ops().is_empty());
    }

    #[tokio::test]
    async fn corrupt_profile_is_a_shape_error() {
        let store = MemoryStore::with_root(json!({ "users": { "u1": { "learningStyle": "podcast" } } }));
        let err = get_profile(&store, "u1").await.unwrap_err();
        assert!(matches!(err, StoreError::Shape { .. }));
    }

    #[tokio::test]
    async fn watch_sees_merges() {
        let store = MemoryStore::new();
        create_default_profile(&store, "u1").await.unwrap();
        let mut sub = watch_profile(&store, "u1").await.unwrap();
        let first: UserProfile = sub.next().await.unwrap().decode().unwrap().unwrap();
        assert_eq!(first.weekly_hours, 5);

        let patch = ProfilePatch {
            weekly_hours: Some(8),
            ..Default::default()
        };
        merge_profile(&store, "u1", &patch).await.unwrap();
        let second: UserProfile = sub.next().await.unwrap().decode().unwrap().unwrap();
        assert_eq!(second.weekly_hours, 8);
    }
}
