use axum::extract::State;
use axum::Json;
use ramplo_core::error::RampError;
use ramplo_core::profile::UserProfile;

use crate::auth::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/profile: the caller's stored onboarding profile.
pub async fn get_profile(
    State(app): State<AppState>,
    caller: Caller,
) -> Result<Json<UserProfile>, AppError> {
    let profile = tokio::task::spawn_blocking(move || {
        app.store
            .profile(caller.id())?
            .ok_or_else(|| RampError::ProfileNotFound(caller.0.clone()))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(profile))
}
