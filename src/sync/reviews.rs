//! Review mutations. Nothing here touches the cache; refreshing review lists
//! after a change is the caller's job.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::client::MensaApiClient;
use crate::errors::AppError;
use crate::models::{
    CanteenReview, CreateCanteenReviewRequest, CreateMealReviewRequest, MealReview,
    UpdateReviewRequest,
};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Counts one in-flight mutation for as long as it lives.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl<'a> InFlightGuard<'a> {
    fn acquire(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::AcqRel);
        Self(in_flight)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Sends review mutations and exposes `{submitting, error}`.
///
/// `submitting` holds while any mutation is in flight. `last_error` is the outcome
/// of the most recently started mutation.
pub struct ReviewSubmitter {
    client: MensaApiClient,
    in_flight: AtomicUsize,
    error: Mutex<Option<String>>,
}

impl ReviewSubmitter {
    pub fn new(client: MensaApiClient) -> Self {
        Self {
            client,
            in_flight: AtomicUsize::new(0),
            error: Mutex::new(None),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    pub fn last_error(&self) -> Option<String> {
        self.error.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record_error(&self, error: Option<&AppError>) {
        *self.error.lock().unwrap_or_else(|e| e.into_inner()) = error.map(AppError::message);
    }

    // ==================== CREATE ====================

    pub async fn submit_meal_review(
        &self,
        meal_id: &str,
        rating: u8,
        comment: Option<String>,
    ) -> Result<MealReview, AppError> {
        let request = CreateMealReviewRequest {
            meal_id: meal_id.to_string(),
            rating,
            comment: normalize_comment(comment),
        };
        self.track(
            "submit",
            meal_id,
            validate(meal_id, Some(rating)),
            self.client.create_meal_review(&request),
        )
        .await
    }

    pub async fn submit_canteen_review(
        &self,
        canteen_id: &str,
        rating: u8,
        comment: Option<String>,
    ) -> Result<CanteenReview, AppError> {
        let request = CreateCanteenReviewRequest {
            canteen_id: canteen_id.to_string(),
            rating,
            comment: normalize_comment(comment),
        };
        self.track(
            "submit",
            canteen_id,
            validate(canteen_id, Some(rating)),
            self.client.create_canteen_review(&request),
        )
        .await
    }

    // ==================== UPDATE / DELETE ====================

    pub async fn update_meal_review(
        &self,
        review_id: &str,
        rating: Option<u8>,
        comment: Option<String>,
    ) -> Result<MealReview, AppError> {
        let request = UpdateReviewRequest {
            rating,
            comment: normalize_comment(comment),
        };
        self.track(
            "update",
            review_id,
            validate_update(review_id, &request),
            self.client.update_meal_review(review_id, &request),
        )
        .await
    }

    pub async fn update_canteen_review(
        &self,
        review_id: &str,
        rating: Option<u8>,
        comment: Option<String>,
    ) -> Result<CanteenReview, AppError> {
        let request = UpdateReviewRequest {
            rating,
            comment: normalize_comment(comment),
        };
        self.track(
            "update",
            review_id,
            validate_update(review_id, &request),
            self.client.update_canteen_review(review_id, &request),
        )
        .await
    }

    pub async fn delete_meal_review(&self, review_id: &str) -> Result<(), AppError> {
        self.track(
            "delete",
            review_id,
            validate(review_id, None),
            self.client.delete_meal_review(review_id),
        )
        .await
    }

    pub async fn delete_canteen_review(&self, review_id: &str) -> Result<(), AppError> {
        self.track(
            "delete",
            review_id,
            validate(review_id, None),
            self.client.delete_canteen_review(review_id),
        )
        .await
    }

    /// Run `call` unless validation failed, keeping `submitting` and `last_error` current.
    async fn track<T, F>(
        &self,
        action: &'static str,
        target_id: &str,
        valid: Result<(), AppError>,
        call: F,
    ) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        if let Err(err) = valid {
            self.record_error(Some(&err));
            return Err(err);
        }

        let _guard = InFlightGuard::acquire(&self.in_flight);
        self.record_error(None);

        match call.await {
            Ok(value) => {
                tracing::info!(action, target_id, "Review mutation succeeded");
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(action, target_id, error = %err, "Review mutation failed");
                self.record_error(Some(&err));
                Err(err)
            }
        }
    }
}

fn validate(target_id: &str, rating: Option<u8>) -> Result<(), AppError> {
    if target_id.trim().is_empty() {
        return Err(AppError::Validation("Review target id is required".to_string()));
    }
    if let Some(rating) = rating {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::Validation(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }
    }
    Ok(())
}

fn validate_update(review_id: &str, request: &UpdateReviewRequest) -> Result<(), AppError> {
    validate(review_id, request.rating)?;
    if request.rating.is_none() && request.comment.is_none() {
        return Err(AppError::Validation("Nothing to update".to_string()));
    }
    Ok(())
}

fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating_bounds() {
        assert!(validate("m1", Some(1)).is_ok());
        assert!(validate("m1", Some(5)).is_ok());
        assert!(validate("m1", Some(0)).is_err());
        assert!(validate("m1", Some(6)).is_err());
        assert!(validate("  ", Some(3)).is_err());
        assert!(validate("r1", None).is_ok());
    }

    #[test]
    fn test_validate_update_needs_a_change() {
        let empty = UpdateReviewRequest {
            rating: None,
            comment: None,
        };
        assert!(validate_update("r1", &empty).is_err());

        let comment_only = UpdateReviewRequest {
            rating: None,
            comment: Some("doch gut".to_string()),
        };
        assert!(validate_update("r1", &comment_only).is_ok());
    }

    #[test]
    fn test_normalize_comment() {
        assert_eq!(normalize_comment(Some("  lecker ".to_string())), Some("lecker".to_string()));
        assert_eq!(normalize_comment(Some("   ".to_string())), None);
        assert_eq!(normalize_comment(None), None);
    }

    #[test]
    fn test_guards_count_overlapping_mutations() {
        let in_flight = AtomicUsize::new(0);
        let first = InFlightGuard::acquire(&in_flight);
        let second = InFlightGuard::acquire(&in_flight);
        drop(first);
        assert_eq!(in_flight.load(Ordering::Acquire), 1);
        drop(second);
        assert_eq!(in_flight.load(Ordering::Acquire), 0);
    }

    #[tokio::test]
    async fn test_invalid_rating_never_reaches_network() {
        // Unroutable base URL: any request would fail with a network error
        let client = MensaApiClient::new("http://127.0.0.1:9", None).unwrap();
        let submitter = ReviewSubmitter::new(client);

        let err = submitter.submit_meal_review("m1", 9, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(submitter.last_error().unwrap().contains("between 1 and 5"));
        assert!(!submitter.is_submitting());

        let err = submitter
            .update_canteen_review("r1", Some(0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(matches!(
            submitter.delete_meal_review(" ").await,
            Err(AppError::Validation(_))
        ));
    }
}
