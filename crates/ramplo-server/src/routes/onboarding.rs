use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use ramplo_core::onboarding::complete_onboarding;
use ramplo_core::profile::{OnboardingAnswers, UserProfile};
use ramplo_core::progress::UserProgress;
use serde::{Deserialize, Serialize};

use crate::auth::Caller;
use crate::error::AppError;
use crate::routes::roadmap::RoadmapSelectionView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingBody {
    #[serde(flatten)]
    pub answers: OnboardingAnswers,
    /// Program start; defaults to the server's current date.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingView {
    #[serde(flatten)]
    pub selection: RoadmapSelectionView,
    pub progress: UserProgress,
    pub tasks_created: usize,
}

/// POST /api/onboarding: select the caller's roadmap and create their tasks.
pub async fn onboard(
    State(app): State<AppState>,
    caller: Caller,
    Json(body): Json<OnboardingBody>,
) -> Result<(StatusCode, Json<OnboardingView>), AppError> {
    let profile = UserProfile::from_answers(&body.answers)?;
    let today = body.start_date.unwrap_or_else(super::today);
    let outcome = tokio::task::spawn_blocking(move || {
        complete_onboarding(app.store.as_ref(), &app.roadmaps, caller.id(), &profile, today)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok((
        StatusCode::CREATED,
        Json(OnboardingView {
            selection: RoadmapSelectionView::from(&outcome.selection),
            progress: outcome.progress,
            tasks_created: outcome.tasks_created,
        }),
    ))
}
