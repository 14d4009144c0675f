//! Profile view/edit state.
//!
//! The editor shows the stored profile and keeps a separate edit copy.
//! Remote updates refresh the edit copy only while the user is not editing,
//! so typing is never overwritten by a snapshot.

use thiserror::Error;
use tracing::info;

use reskill_store::models::{ProfilePatch, UserProfile, round_hours};
use reskill_store::queries::profiles;
use reskill_store::{Snapshot, Store, StoreError};

use crate::identity::SessionSignal;

pub const PROFILE_SAVED_MESSAGE: &str = "Perfil atualizado!";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProfileError {
    pub fn user_message(&self) -> String {
        match self {
            Self::NotSignedIn => "Usuário não autenticado.".to_string(),
            Self::Store(e) => e.to_string(),
        }
    }
}

/// Weekly hours from free text: anything that is not a positive number
/// counts as 0.
pub fn parse_weekly_hours(text: &str) -> u32 {
    match text.trim().parse::<f64>() {
        Ok(hours) if hours.is_finite() && hours > 0.0 => round_hours(hours),
        _ => 0,
    }
}

#[derive(Debug, Clone)]
pub struct ProfileEditor {
    uid: String,
    profile: UserProfile,
    draft: UserProfile,
    editing: bool,
    loading: bool,
}

impl ProfileEditor {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            profile: UserProfile::default(),
            draft: UserProfile::default(),
            editing: false,
            loading: true,
        }
    }

    pub fn for_session(signal: &SessionSignal) -> Result<Self, ProfileError> {
        let session = signal.current().ok_or(ProfileError::NotSignedIn)?;
        Ok(Self::new(session.uid))
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// The stored profile.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// The edit copy.
    pub fn draft(&self) -> &UserProfile {
        &self.draft
    }

    /// Mutable edit copy. Changes are only kept while editing.
    pub fn draft_mut(&mut self) -> &mut UserProfile {
        &mut self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn begin_edit(&mut self) {
        self.draft = self.profile.clone();
        self.editing = true;
    }

    pub fn cancel(&mut self) {
        self.draft = self.profile.clone();
        self.editing = false;
    }

    /// Take a remote profile snapshot.
    pub fn apply_remote(&mut self, snapshot: &Snapshot) -> Result<(), ProfileError> {
        let decoded = snapshot.decode::<UserProfile>();
        self.loading = false;
        if let Some(profile) = decoded? {
            if !self.editing {
                self.draft = profile.clone();
            }
            self.profile = profile;
        }
        Ok(())
    }

    /// One-shot fetch for callers without a subscription.
    pub async fn load(&mut self, store: &dyn Store) -> Result<(), ProfileError> {
        let profile = profiles::get_profile(store, &self.uid).await?;
        self.loading = false;
        if let Some(profile) = profile {
            if !self.editing {
                self.draft = profile.clone();
            }
            self.profile = profile;
        }
        Ok(())
    }

    /// Merge the edit copy into the stored profile and leave edit mode.
    /// On failure the editor stays in edit mode with the draft intact.
    pub async fn save(&mut self, store: &dyn Store) -> Result<(), ProfileError> {
        let patch = ProfilePatch::from_profile(&self.draft);
        profiles::merge_profile(store, &self.uid, &patch).await?;
        info!(uid = %self.uid, "profile saved");
        self.profile = self.draft.clone();
        self.editing = false;
        Ok(())
    }
}
