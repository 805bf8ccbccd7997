use axum::extract::{Path, State};
use axum::Json;
use ramplo_core::catalog::{SprintSummary, SprintTemplate};
use ramplo_core::outreach::OutreachTemplate;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/catalog/sprints: summaries of every sprint, in catalog order.
pub async fn list_sprints(State(app): State<AppState>) -> Json<Vec<SprintSummary>> {
    Json(app.catalog.summaries())
}

/// GET /api/catalog/sprints/:id: one sprint with its full week/day structure.
pub async fn get_sprint(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SprintTemplate>, AppError> {
    let sprint = app.catalog.require(&id)?;
    Ok(Json(SprintTemplate::clone(sprint)))
}

/// GET /api/catalog/templates: every outreach template.
pub async fn list_templates(State(app): State<AppState>) -> Json<Vec<OutreachTemplate>> {
    Json(app.outreach.list().to_vec())
}
