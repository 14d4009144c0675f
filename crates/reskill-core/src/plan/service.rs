//! The plan board: one user's plan for one week, kept in sync with the
//! store.
//!
//! The board holds what the plan screen shows (profile, plan, loading and
//! generating flags). Live updates arrive through [`PlanBoard::apply_profile`]
//! and [`PlanBoard::apply_plan`]; [`PlanBoard::generate`] and
//! [`PlanBoard::toggle_task`] write through to the store. A failed operation
//! leaves the board as it was, apart from clearing the generating flag.

use tracing::{info, warn};

use reskill_store::models::{UserProfile, WeeklyPlan};
use reskill_store::queries::{plans, profiles};
use reskill_store::{Snapshot, Store};

use super::error::PlanError;
use super::generate::{PlanDraft, build_plan_prompt};
use super::materialize::materialize_plan;
use crate::extract::extract_json;
use crate::genai::Generator;
use crate::identity::SessionSignal;
use crate::week::WeekId;

pub const PLAN_CREATED_MESSAGE: &str = "Seu plano semanal foi gerado com IA.";

#[derive(Debug, Clone)]
pub struct PlanBoard {
    uid: String,
    week: WeekId,
    profile: Option<UserProfile>,
    plan: Option<WeeklyPlan>,
    loading: bool,
    generating: bool,
}

impl PlanBoard {
    pub fn new(uid: impl Into<String>, week: WeekId) -> Self {
        Self {
            uid: uid.into(),
            week,
            profile: None,
            plan: None,
            loading: true,
            generating: false,
        }
    }

    /// A board for the signed-in user.
    pub fn for_session(signal: &SessionSignal, week: WeekId) -> Result<Self, PlanError> {
        let session = signal.current().ok_or(PlanError::NotSignedIn)?;
        Ok(Self::new(session.uid, week))
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn week(&self) -> WeekId {
        self.week
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn plan(&self) -> Option<&WeeklyPlan> {
        self.plan.as_ref()
    }

    /// True until the first plan snapshot (or load) arrives.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    // -----------------------------------------------------------------------
    // Remote state
    // -----------------------------------------------------------------------

    /// Take a profile snapshot. An absent document keeps the last profile.
    pub fn apply_profile(&mut self, snapshot: &Snapshot) -> Result<(), PlanError> {
        if let Some(profile) = snapshot.decode::<UserProfile>()? {
            self.profile = Some(profile);
        }
        Ok(())
    }

    /// Take a plan snapshot. An absent document keeps the last plan.
    pub fn apply_plan(&mut self, snapshot: &Snapshot) -> Result<(), PlanError> {
        let decoded = snapshot.decode::<WeeklyPlan>();
        self.loading = false;
        if let Some(plan) = decoded? {
            self.plan = Some(plan);
        }
        Ok(())
    }

    /// One-shot fetch of profile and plan, for callers without a live
    /// subscription.
    pub async fn load(&mut self, store: &dyn Store) -> Result<(), PlanError> {
        let profile = profiles::get_profile(store, &self.uid).await?;
        let plan = plans::get_plan(store, &self.uid, &self.week.to_string()).await?;
        if profile.is_some() {
            self.profile = profile;
        }
        if plan.is_some() {
            self.plan = plan;
        }
        self.loading = false;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Generate this week's plan from the profile, overwrite the stored
    /// plan with it, and show it.
    pub async fn generate(
        &mut self,
        generator: &dyn Generator,
        store: &dyn Store,
    ) -> Result<&WeeklyPlan, PlanError> {
        let profile = self.profile.clone().ok_or(PlanError::ProfileMissing)?;

        self.generating = true;
        let result = self.build_plan(generator, store, &profile).await;
        self.generating = false;

        match result {
            Ok(plan) => Ok(self.plan.insert(plan)),
            Err(e) => {
                warn!(uid = %self.uid, week = %self.week, error = %e, "plan generation failed");
                Err(e)
            }
        }
    }

    async fn build_plan(
        &self,
        generator: &dyn Generator,
        store: &dyn Store,
        profile: &UserProfile,
    ) -> Result<WeeklyPlan, PlanError> {
        let raw = generator.generate_json(&build_plan_prompt(profile)).await?;
        let draft: PlanDraft = extract_json(&raw)?;
        let plan = materialize_plan(self.week, draft);
        plans::put_plan(store, &self.uid, &plan).await?;
        info!(
            uid = %self.uid,
            week = %self.week,
            tasks = plan.tasks.len(),
            generator = generator.name(),
            "plan generated"
        );
        Ok(plan)
    }

    /// Flip one task's `done` flag. Only that field is written.
    ///
    /// Returns the new value. If the stored plan no longer has this task at
    /// the same position (it was regenerated elsewhere), nothing is written
    /// and the task is reported as unknown.
    pub async fn toggle_task(&mut self, store: &dyn Store, task_id: &str) -> Result<bool, PlanError> {
        let plan = self.plan.as_ref().ok_or(PlanError::NoPlan)?;
        let index = plan
            .task_index(task_id)
            .ok_or_else(|| PlanError::UnknownTask(task_id.to_string()))?;
        let done = !plan.tasks[index].done;

        let week = self.week.to_string();
        if !plans::set_task_done(store, &self.uid, &week, index, task_id, done).await? {
            return Err(PlanError::UnknownTask(task_id.to_string()));
        }

        if let Some(plan) = self.plan.as_mut() {
            plan.tasks[index].done = done;
        }
        Ok(done)
    }
}
