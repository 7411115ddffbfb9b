//! Canteen list and today's menu endpoints, served through the cache.

use axum::extract::{Path, State};

use super::{success, ApiResult};
use crate::models::{Canteen, Menu};
use crate::AppState;

/// GET /api/canteens - Canteen list, from cache while valid.
pub async fn list_canteens(State(state): State<AppState>) -> ApiResult<Vec<Canteen>> {
    let canteens = state.data.canteens().await?;
    success(canteens.as_ref().clone())
}

/// POST /api/canteens/refresh - Force a fresh canteen list.
pub async fn refresh_canteens(State(state): State<AppState>) -> ApiResult<Vec<Canteen>> {
    let canteens = state.data.refetch_canteens().await?;
    success(canteens.as_ref().clone())
}

/// GET /api/canteens/:id/menu/today - Today's menu, from cache while valid.
pub async fn get_today_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Menu> {
    let menu = state.data.today_menu(&id).await?;
    success(menu.as_ref().clone())
}

/// POST /api/canteens/:id/menu/today/refresh - Force a fresh menu.
pub async fn refresh_today_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Menu> {
    let menu = state.data.refetch_today_menu(&id).await?;
    success(menu.as_ref().clone())
}

/// DELETE /api/cache - Global cache reset.
pub async fn clear_cache(State(state): State<AppState>) -> ApiResult<()> {
    state.data.invalidate_all().await;
    success(())
}
