use thiserror::Error;

use reskill_store::StoreError;

use crate::extract::ExtractError;
use crate::genai::GenerationError;

pub const PROFILE_MISSING_MESSAGE: &str = "Preencha seu perfil antes de gerar o plano.";
pub const NOT_SIGNED_IN_MESSAGE: &str = "Usuário não autenticado.";
pub const PLAN_FAILED_MESSAGE: &str =
    "Não foi possível gerar o plano. Tente novamente em alguns minutos.";

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no profile loaded; fill in the profile before generating a plan")]
    ProfileMissing,

    #[error("not signed in")]
    NotSignedIn,

    #[error("no plan for this week yet")]
    NoPlan,

    #[error("unknown task {0:?}")]
    UnknownTask(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PlanError {
    /// Text to show the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ProfileMissing => PROFILE_MISSING_MESSAGE,
            Self::NotSignedIn => NOT_SIGNED_IN_MESSAGE,
            _ => PLAN_FAILED_MESSAGE,
        }
    }
}
