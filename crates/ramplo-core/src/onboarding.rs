use crate::error::{RampError, Result};
use crate::profile::UserProfile;
use crate::progress::UserProgress;
use crate::roadmap::{RoadmapSelection, RoadmapSelector};
use crate::store::Store;
use crate::task::materialize;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct OnboardingOutcome {
    pub selection: RoadmapSelection,
    pub progress: UserProgress,
    pub tasks_created: usize,
}

/// Select a roadmap for the user and materialize its tasks.
///
/// Runs once per user. Progress, profile and tasks are written in one store
/// transaction: a failed attempt leaves nothing behind and can be retried,
/// and a concurrent second attempt fails with `AlreadyOnboarded`.
pub fn complete_onboarding(
    store: &dyn Store,
    selector: &RoadmapSelector,
    user_id: &str,
    profile: &UserProfile,
    today: NaiveDate,
) -> Result<OnboardingOutcome> {
    if user_id.trim().is_empty() {
        return Err(RampError::Validation("user id must not be empty".into()));
    }
    if store.progress(user_id)?.is_some() {
        return Err(RampError::AlreadyOnboarded(user_id.to_string()));
    }

    let selection = selector.select(profile);
    let progress = UserProgress::new(user_id, &selection.selected.id, today);
    let tasks = materialize(store, &progress, profile, &selection.selected)?;

    tracing::info!(
        user = user_id,
        sprint = %selection.selected.id,
        source = %selection.source,
        tasks = tasks.len(),
        "onboarding complete"
    );

    Ok(OnboardingOutcome {
        selection,
        progress,
        tasks_created: tasks.len(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
