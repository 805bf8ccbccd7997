use axum::extract::State;
use axum::Json;
use ramplo_core::catalog::SprintSummary;
use ramplo_core::profile::{OnboardingAnswers, UserProfile};
use ramplo_core::roadmap::RoadmapSelection;
use ramplo_core::selector::SelectionSource;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapSelectionView {
    pub selected_roadmap: SprintSummary,
    pub reasoning: String,
    pub alternative_options: Vec<SprintSummary>,
    pub source: SelectionSource,
}

impl From<&RoadmapSelection> for RoadmapSelectionView {
    fn from(selection: &RoadmapSelection) -> Self {
        Self {
            selected_roadmap: selection.selected.summary(),
            reasoning: selection.reasoning.clone(),
            alternative_options: selection.alternatives.iter().map(|s| s.summary()).collect(),
            source: selection.source,
        }
    }
}

/// POST /api/roadmap/select: preview the roadmap a profile would get.
///
/// Nothing is stored; onboarding is the only path that materializes tasks.
pub async fn select_roadmap(
    State(app): State<AppState>,
    Json(answers): Json<OnboardingAnswers>,
) -> Result<Json<RoadmapSelectionView>, AppError> {
    let profile = UserProfile::from_answers(&answers)?;
    let selector = app.roadmaps.clone();
    let selection = tokio::task::spawn_blocking(move || selector.select(&profile))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;

    Ok(Json(RoadmapSelectionView::from(&selection)))
}
