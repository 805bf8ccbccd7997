use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use ramplo_core::progress::{ProgressReport, UserProgress};
use serde::Deserialize;

use crate::auth::Caller;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CursorBody {
    pub week: u32,
    pub day: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomesBody {
    #[serde(default)]
    pub applications: u32,
    #[serde(default)]
    pub loans: u32,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// GET /api/progress: counters, ramp-run days, streak and today's summary.
pub async fn get_progress(
    State(app): State<AppState>,
    caller: Caller,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ProgressReport>, AppError> {
    let today = query.today.unwrap_or_else(super::today);
    let report = tokio::task::spawn_blocking(move || app.tracker.report(caller.id(), today))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(report))
}

/// POST /api/progress/advance: move the cursor to the next program day.
pub async fn advance(
    State(app): State<AppState>,
    caller: Caller,
) -> Result<Json<UserProgress>, AppError> {
    let progress = tokio::task::spawn_blocking(move || app.tracker.advance(caller.id()))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(progress))
}

/// PUT /api/progress/cursor: jump to a specific week and day.
pub async fn set_cursor(
    State(app): State<AppState>,
    caller: Caller,
    Json(body): Json<CursorBody>,
) -> Result<Json<UserProgress>, AppError> {
    let progress = tokio::task::spawn_blocking(move || {
        app.tracker.set_cursor(caller.id(), body.week, body.day)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(progress))
}

/// POST /api/progress/outcomes: add submitted applications and closed loans.
pub async fn record_outcomes(
    State(app): State<AppState>,
    caller: Caller,
    Json(body): Json<OutcomesBody>,
) -> Result<Json<UserProgress>, AppError> {
    if body.applications == 0 && body.loans == 0 {
        return Err(AppError::bad_request("nothing to record: applications and loans are both 0"));
    }
    let date = body.date.unwrap_or_else(super::today);
    let progress = tokio::task::spawn_blocking(move || {
        app.tracker
            .record_outcomes(caller.id(), body.applications, body.loans, date)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(progress))
}
