//! Preference endpoints.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::models::Preferences;
use crate::AppState;

/// GET /api/preferences
pub async fn get_preferences(State(state): State<AppState>) -> ApiResult<Preferences> {
    success(state.settings.load_preferences().await?)
}

/// PUT /api/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(preferences): Json<Preferences>,
) -> ApiResult<Preferences> {
    state.settings.save_preferences(&preferences).await?;
    success(preferences)
}
