//! Weekly study plans: prompt construction, materialization of the
//! generated draft, and the board that keeps one week's plan in sync.

pub mod error;
pub mod generate;
pub mod materialize;
pub mod service;

pub use error::PlanError;
pub use generate::{PlanDraft, TaskDraft, build_plan_prompt};
pub use materialize::{materialize_plan, materialize_task};
pub use service::{PLAN_CREATED_MESSAGE, PlanBoard};
