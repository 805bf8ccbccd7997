use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use ramplo_core::progress::{ConnectionCounts, DailyConnections};

use crate::auth::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// PUT /api/connections/:date: replace the caller's connection counts for a day.
pub async fn put_connections(
    State(app): State<AppState>,
    caller: Caller,
    Path(date): Path<NaiveDate>,
    Json(counts): Json<ConnectionCounts>,
) -> Result<Json<DailyConnections>, AppError> {
    let logged = tokio::task::spawn_blocking(move || {
        app.tracker
            .record_daily_connections(caller.id(), date, counts)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(logged))
}

/// GET /api/connections/:date: the caller's counts for a day, zero when nothing was logged.
pub async fn get_connections(
    State(app): State<AppState>,
    caller: Caller,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DailyConnections>, AppError> {
    let logged = tokio::task::spawn_blocking(move || {
        let found = app.store.connections(caller.id(), date)?;
        Ok::<_, ramplo_core::RampError>(found.unwrap_or_else(|| DailyConnections {
            user_id: caller.0.clone(),
            date,
            counts: ConnectionCounts::default(),
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(logged))
}
