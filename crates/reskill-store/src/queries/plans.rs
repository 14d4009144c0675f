//! Weekly plan documents at `plans/{uid}/{weekId}`.

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::models::{Task, WeeklyPlan, task_id_from_value};
use crate::paths;
use crate::store::Store;
use crate::subscription::Subscription;

use super::decode;

/// Fetch the plan for one week.
pub async fn get_plan(
    store: &dyn Store,
    uid: &str,
    week_id: &str,
) -> Result<Option<WeeklyPlan>, StoreError> {
    let path = paths::plan_path(uid, week_id)?;
    match store.get(&path).await? {
        Some(value) => decode(&path, value).map(Some),
        None => Ok(None),
    }
}

/// Write (or overwrite) a whole plan under its own `week_id`.
pub async fn put_plan(store: &dyn Store, uid: &str, plan: &WeeklyPlan) -> Result<(), StoreError> {
    let path = paths::plan_path(uid, &plan.week_id)?;
    store.set(&path, &serde_json::to_value(plan)?).await?;
    info!(uid, week_id = %plan.week_id, tasks = plan.tasks.len(), "plan written");
    Ok(())
}

/// Merge a new task list, leaving `weekId` and `summary` untouched.
pub async fn update_tasks(
    store: &dyn Store,
    uid: &str,
    week_id: &str,
    tasks: &[Task],
) -> Result<(), StoreError> {
    let path = paths::plan_path(uid, week_id)?;
    let mut fields = Map::new();
    fields.insert("tasks".into(), serde_json::to_value(tasks)?);
    store.update(&path, &fields).await
}

/// Write a single task's `done` flag (`tasks/{index}/done`) and nothing else.
///
/// The stored task at `index` must still carry `task_id`; if the plan was
/// rewritten elsewhere nothing is written and `false` is returned.
pub async fn set_task_done(
    store: &dyn Store,
    uid: &str,
    week_id: &str,
    index: usize,
    task_id: &str,
    done: bool,
) -> Result<bool, StoreError> {
    let path = paths::plan_path(uid, week_id)?;
    let stored_id = store
        .get(&paths::join(&path, &format!("tasks/{index}/id")))
        .await?
        .as_ref()
        .and_then(task_id_from_value);
    if stored_id.as_deref() != Some(task_id) {
        warn!(uid, week_id, index, task_id, ?stored_id, "task moved, not toggling");
        return Ok(false);
    }

    let mut fields = Map::new();
    fields.insert(format!("tasks/{index}/done"), Value::Bool(done));
    store.update(&path, &fields).await?;
    Ok(true)
}

/// Live view of one week's plan.
pub async fn watch_plan(store: &dyn Store, uid: &str, week_id: &str) -> Result<Subscription, StoreError> {
    let path = paths::plan_path(uid, week_id)?;
    store.subscribe(&path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStore, StoreOp};
    use serde_json::json;

    fn sample_plan() -> WeeklyPlan {
        WeeklyPlan {
            week_id: "2025-03-w2".into(),
            summary: "Fundamentos".into(),
            tasks: vec![
                Task {
                    id: "1".into(),
                    title: "HTML".into(),
                    description: "Estrutura".into(),
                    estimated_minutes: 45,
                    done: false,
                },
                Task {
                    id: "2".into(),
                    title: "CSS".into(),
                    description: "Estilo".into(),
                    estimated_minutes: 60,
                    done: false,
                },
            ],
        }
    }

    #[tokio::test]
    async fn put_and_get_plan() {
        let store = MemoryStore::new();
        put_plan(&store, "u1", &sample_plan()).await.unwrap();
        let loaded = get_plan(&store, "u1", "2025-03-w2").await.unwrap().unwrap();
        assert_eq!(loaded, sample_plan());
        assert!(get_plan(&store, "u1", "2025-03-w3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_task_done_writes_one_field() {
        let store = MemoryStore::new();
        put_plan(&store, "u1", &sample_plan()).await.unwrap();
        assert!(set_task_done(&store, "u1", "2025-03-w2", 1, "2", true).await.unwrap());

        let loaded = get_plan(&store, "u1", "2025-03-w2").await.unwrap().unwrap();
        assert!(loaded.tasks[1].done);
        assert!(!loaded.tasks[0].done);
        assert_eq!(loaded.summary, "Fundamentos");

        let last = store.ops().pop().unwrap();
        assert_eq!(
            last,
            StoreOp::Update {
                path: "plans/u1/2025-03-w2".into(),
                fields: Map::from_iter([("tasks/1/done".to_string(), json!(true))]),
            }
        );
    }

    #[tokio::test]
    async fn set_task_done_skips_a_rewritten_plan() {
        let store = MemoryStore::new();
        put_plan(&store, "u1", &sample_plan()).await.unwrap();
        let mut shorter = sample_plan();
        shorter.tasks.truncate(1);
        put_plan(&store, "u1", &shorter).await.unwrap();
        let writes = store.ops().len();

        assert!(!set_task_done(&store, "u1", "2025-03-w2", 1, "2", true).await.unwrap());
        assert!(!set_task_done(&store, "u1", "2025-03-w2", 0, "2", true).await.unwrap());
        assert_eq!(store.ops().len(), writes);
        assert_eq!(get_plan(&store, "u1", "2025-03-w2").await.unwrap(), Some(shorter));
    }

    #[tokio::test]
    async fn set_task_done_matches_numeric_ids() {
        let store = MemoryStore::new();
        store
            .set(
                "plans/u1/2025-03-w2",
                &json!({ "weekId": "2025-03-w2", "tasks": [{ "id": 1, "title": "HTML" }] }),
            )
            .await
            .unwrap();
        assert!(set_task_done(&store, "u1", "2025-03-w2", 0, "1", true).await.unwrap());
        let loaded = get_plan(&store, "u1", "2025-03-w2").await.unwrap().unwrap();
        assert!(loaded.tasks[0].done);
        assert_eq!(loaded.tasks[0].id, "1");
    }

    #[tokio::test]
    async fn update_tasks_keeps_summary() {
        let store = MemoryStore::new();
        put_plan(&store, "u1", &sample_plan()).await.unwrap();
        let mut tasks = sample_plan().tasks;
        tasks[0].done = true;
        update_tasks(&store, "u1", "2025-03-w2", &tasks).await.unwrap();

        let loaded = get_plan(&store, "u1", "2025-03-w2").await.unwrap().unwrap();
        assert_eq!(loaded.summary, "Fundamentos");
        assert!(loaded.tasks[0].done);
    }

    #[tokio::test]
    async fn invalid_week_id_is_rejected() {
        let store = MemoryStore::new();
        let err = get_plan(&store, "u1", "2025.03").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }
}
