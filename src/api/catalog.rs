//! Uncached passthrough endpoints for meals, badges and additives.

use axum::extract::{Query, State};

use super::{success, ApiResult};
use crate::client::MealFilter;
use crate::models::{Additive, Badge, Meal};
use crate::AppState;

/// GET /api/meals - Meals matching the filter.
pub async fn list_meals(
    State(state): State<AppState>,
    Query(filter): Query<MealFilter>,
) -> ApiResult<Vec<Meal>> {
    success(state.data.client().meals(&filter).await?)
}

/// GET /api/badges
pub async fn list_badges(State(state): State<AppState>) -> ApiResult<Vec<Badge>> {
    success(state.data.client().badges().await?)
}

/// GET /api/additives
pub async fn list_additives(State(state): State<AppState>) -> ApiResult<Vec<Additive>> {
    success(state.data.client().additives().await?)
}
