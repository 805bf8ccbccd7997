use axum::extract::State;
use axum::Json;
use ramplo_core::outreach::{
    Personalization, RenderedTemplate, TemplateQuery, TemplateSelection, DEFAULT_LIMIT,
};
use ramplo_core::profile::{OnboardingAnswers, UserProfile};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Upper bound on templates returned by one selection.
pub const MAX_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectTemplatesBody {
    #[serde(flatten)]
    pub answers: OnboardingAnswers,
    #[serde(default)]
    pub limit: Option<usize>,
    /// When present, the selected templates are also returned rendered.
    #[serde(default)]
    pub personalization: Option<Personalization>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSelectionView {
    #[serde(flatten)]
    pub selection: TemplateSelection,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rendered: Vec<RenderedTemplate>,
}

/// POST /api/templates/select: outreach templates suited to a profile.
pub async fn select_templates(
    State(app): State<AppState>,
    Json(body): Json<SelectTemplatesBody>,
) -> Result<Json<TemplateSelectionView>, AppError> {
    let limit = body.limit.unwrap_or(DEFAULT_LIMIT);
    if limit > MAX_LIMIT {
        return Err(AppError::bad_request(format!(
            "limit must be at most {MAX_LIMIT}, got {limit}"
        )));
    }
    let query = TemplateQuery {
        profile: UserProfile::from_answers(&body.answers)?,
        limit,
    };
    let selector = app.templates.clone();
    let selection = tokio::task::spawn_blocking(move || selector.select(&query))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;

    let rendered = match &body.personalization {
        Some(values) => selection.templates.iter().map(|t| t.render(values)).collect(),
        None => Vec::new(),
    };
    Ok(Json(TemplateSelectionView { selection, rendered }))
}
