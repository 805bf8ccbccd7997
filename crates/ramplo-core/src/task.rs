use crate::catalog::SprintTemplate;
use crate::error::Result;
use crate::profile::UserProfile;
use crate::progress::UserProgress;
use crate::store::Store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's copy of one catalog task.
///
/// Tasks are snapshots: editing the catalog later does not change them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub estimated_minutes: u32,
    pub week: u32,
    pub day: u32,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A task about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub estimated_minutes: u32,
    pub week: u32,
    pub day: u32,
}

/// One pending task per template in the sprint, in catalog order.
pub fn planned_tasks(user_id: &str, sprint: &SprintTemplate) -> Vec<NewTask> {
    sprint
        .tasks()
        .map(|t| NewTask {
            user_id: user_id.to_string(),
            title: t.title.clone(),
            description: t.description.clone(),
            category: t.category.clone(),
            estimated_minutes: t.estimated_minutes,
            week: t.week,
            day: t.day,
        })
        .collect()
}

/// Copy every task template of `sprint` into the user's task list.
///
/// Written together with the progress row and profile, so a user either has
/// the whole task list or is not onboarded at all. A second call for the same
/// user fails with `AlreadyOnboarded`.
pub fn materialize(
    store: &dyn Store,
    progress: &UserProgress,
    profile: &UserProfile,
    sprint: &SprintTemplate,
) -> Result<Vec<Task>> {
    let user_id = progress.user_id.as_str();
    let planned = planned_tasks(user_id, sprint);
    let tasks = store.onboard(progress, profile, &planned, Utc::now())?;
    tracing::info!(user = user_id, sprint = %sprint.id, count = tasks.len(), "materialized tasks");
    Ok(tasks)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
