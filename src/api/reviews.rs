//! Review endpoints. Mutations go straight to the remote API.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::models::{CanteenReview, MealReview, SubmitReviewRequest, UpdateReviewRequest};
use crate::AppState;

/// GET /api/meals/:id/reviews
pub async fn list_meal_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<MealReview>> {
    success(state.data.client().meal_reviews(&id).await?)
}

/// POST /api/meals/:id/reviews
pub async fn submit_meal_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SubmitReviewRequest>,
) -> ApiResult<MealReview> {
    let review = state
        .reviews
        .submit_meal_review(&id, request.rating, request.comment)
        .await?;
    success(review)
}

/// GET /api/canteens/:id/reviews
pub async fn list_canteen_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<CanteenReview>> {
    success(state.data.client().canteen_reviews(&id).await?)
}

/// POST /api/canteens/:id/reviews
pub async fn submit_canteen_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SubmitReviewRequest>,
) -> ApiResult<CanteenReview> {
    let review = state
        .reviews
        .submit_canteen_review(&id, request.rating, request.comment)
        .await?;
    success(review)
}

/// PUT /api/meal-reviews/:id
pub async fn update_meal_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateReviewRequest>,
) -> ApiResult<MealReview> {
    success(
        state
            .reviews
            .update_meal_review(&id, request.rating, request.comment)
            .await?,
    )
}

/// DELETE /api/meal-reviews/:id
pub async fn delete_meal_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.reviews.delete_meal_review(&id).await?;
    success(())
}

/// PUT /api/canteen-reviews/:id
pub async fn update_canteen_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateReviewRequest>,
) -> ApiResult<CanteenReview> {
    success(
        state
            .reviews
            .update_canteen_review(&id, request.rating, request.comment)
            .await?,
    )
}

/// DELETE /api/canteen-reviews/:id
pub async fn delete_canteen_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.reviews.delete_canteen_review(&id).await?;
    success(())
}
