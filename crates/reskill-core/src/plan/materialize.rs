//! Turn a generated [`PlanDraft`] into the persisted [`WeeklyPlan`].
//!
//! - missing or empty `id` becomes the 1-based position,
//! - missing, non-numeric or non-positive `estimatedMinutes` becomes 45,
//! - every task starts not done.

use serde_json::Value;

use reskill_store::models::{Task, WeeklyPlan, minutes_from_value, task_id_from_value};

use super::generate::{PlanDraft, TaskDraft};
use crate::week::WeekId;

/// Stamp `week` into the plan and apply task defaults.
pub fn materialize_plan(week: WeekId, draft: PlanDraft) -> WeeklyPlan {
    WeeklyPlan {
        week_id: week.to_string(),
        summary: draft.summary.unwrap_or_default(),
        tasks: draft
            .tasks
            .into_iter()
            .enumerate()
            .map(|(i, task)| materialize_task(i + 1, task))
            .collect(),
    }
}

/// Apply defaults to one draft task at 1-based `position`.
pub fn materialize_task(position: usize, draft: TaskDraft) -> Task {
    Task {
        id: task_id(draft.id.as_ref()).unwrap_or_else(|| position.to_string()),
        title: draft.title.unwrap_or_default(),
        description: draft.description.unwrap_or_default(),
        estimated_minutes: minutes(draft.estimated_minutes.as_ref())
            .unwrap_or(Task::DEFAULT_ESTIMATED_MINUTES),
        done: false,
    }
}

fn task_id(value: Option<&Value>) -> Option<String> {
    task_id_from_value(value?)
}

fn minutes(value: Option<&Value>) -> Option<u32> {
    minutes_from_value(value?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn week() -> WeekId {
        WeekId::for_date(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
    }

    fn draft(value: Value) -> PlanDraft {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn stamps_week_and_defaults() {
        let plan = materialize_plan(
            week(),
            draft(json!({
                "summary": "Base de dados",
                "tasks": [
                    { "id": "sql", "title": "SQL", "description": "joins", "estimatedMinutes": 60 },
                    { "title": "Pandas" }
                ]
            })),
        );
        assert_eq!(plan.week_id, "2025-03-w2");
        assert_eq!(plan.summary, "Base de dados");
        assert_eq!(plan.tasks[0].id, "sql");
        assert_eq!(plan.tasks[0].estimated_minutes, 60);
        assert_eq!(plan.tasks[1].id, "2");
        assert_eq!(plan.tasks[1].estimated_minutes, 45);
        assert_eq!(plan.tasks[1].description, "");
        assert!(plan.tasks.iter().all(|t| !t.done));
    }

    #[test]
    fn empty_id_uses_position() {
        let task = materialize_task(3, TaskDraft {
            id: Some(json!("")),
            ..Default::default()
        });
        assert_eq!(task.id, "3");
        let task = materialize_task(1, TaskDraft {
            id: Some(json!(7)),
            ..Default::default()
        });
        assert_eq!(task.id, "7");
    }

    #[test]
    fn loose_minutes() {
        let m = |v: Value| minutes(Some(&v));
        assert_eq!(m(json!(30)), Some(30));
        assert_eq!(m(json!("25")), Some(25));
        assert_eq!(m(json!(44.6)), Some(45));
        assert_eq!(m(json!(0)), None);
        assert_eq!(m(json!(-10)), None);
        assert_eq!(m(json!("meia hora")), None);
        assert_eq!(m(Value::Null), None);
    }

    #[test]
    fn missing_summary_is_empty() {
        let plan = materialize_plan(week(), draft(json!({ "tasks": [] })));
        assert_eq!(plan.summary, "");
        assert!(plan.tasks.is_empty());
    }
}
