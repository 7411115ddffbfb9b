//! HTTP client for the remote Mensa REST API.
//!
//! Every request carries the API key header and a JSON content type, and fails
//! after a fixed timeout.

mod query;

pub use query::*;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{
    Additive, Badge, Canteen, CanteenReview, CreateCanteenReviewRequest, CreateMealReviewRequest,
    Meal, MealReview, Menu, UpdateReviewRequest,
};

/// Header carrying the remote API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Fixed timeout for every remote call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed client for the canteen/meal/menu/review endpoints.
#[derive(Clone)]
pub struct MensaApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl MensaApiClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, AppError> {
        Self::with_timeout(base_url, api_key, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| AppError::Internal(format!("Invalid API key header: {}", e)))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, path))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<T, AppError> {
        tracing::debug!(path, ?params, "GET Mensa API");
        self.execute(self.request(Method::GET, path).query(params))
            .await
    }

    // ==================== READS ====================

    pub async fn canteens(&self, query: &CanteenQuery) -> Result<Vec<Canteen>, AppError> {
        self.get("canteen", &query.to_params()).await
    }

    pub async fn meals(&self, filter: &MealFilter) -> Result<Vec<Meal>, AppError> {
        self.get("meal", &filter.to_params()).await
    }

    pub async fn menus(&self, query: &MenuQuery) -> Result<Vec<Menu>, AppError> {
        self.get("menue", &query.to_params()).await
    }

    pub async fn badges(&self) -> Result<Vec<Badge>, AppError> {
        self.get("badge", &Params::new()).await
    }

    pub async fn additives(&self) -> Result<Vec<Additive>, AppError> {
        self.get("additive", &Params::new()).await
    }

    pub async fn meal_reviews(&self, meal_id: &str) -> Result<Vec<MealReview>, AppError> {
        self.get("mealreview", &vec![("mealId", meal_id.to_string())])
            .await
    }

    pub async fn canteen_reviews(&self, canteen_id: &str) -> Result<Vec<CanteenReview>, AppError> {
        self.get("canteenreview", &vec![("canteenId", canteen_id.to_string())])
            .await
    }

    // ==================== MUTATIONS ====================

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        tracing::debug!(%method, path, "Mensa API mutation");
        self.execute(self.request(method, path).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), AppError> {
        tracing::debug!(path, "DELETE Mensa API");
        check_status(self.request(Method::DELETE, path).send().await?).await?;
        Ok(())
    }

    pub async fn create_meal_review(
        &self,
        request: &CreateMealReviewRequest,
    ) -> Result<MealReview, AppError> {
        self.send_json(Method::POST, "mealreview", request).await
    }

    pub async fn update_meal_review(
        &self,
        id: &str,
        request: &UpdateReviewRequest,
    ) -> Result<MealReview, AppError> {
        self.send_json(Method::PUT, &format!("mealreview/{}", id), request)
            .await
    }

    pub async fn delete_meal_review(&self, id: &str) -> Result<(), AppError> {
        self.delete(&format!("mealreview/{}", id)).await
    }

    pub async fn create_canteen_review(
        &self,
        request: &CreateCanteenReviewRequest,
    ) -> Result<CanteenReview, AppError> {
        self.send_json(Method::POST, "canteenreview", request).await
    }

    pub async fn update_canteen_review(
        &self,
        id: &str,
        request: &UpdateReviewRequest,
    ) -> Result<CanteenReview, AppError> {
        self.send_json(Method::PUT, &format!("canteenreview/{}", id), request)
            .await
    }

    pub async fn delete_canteen_review(&self, id: &str) -> Result<(), AppError> {
        self.delete(&format!("canteenreview/{}", id)).await
    }
}

/// Turn non-success statuses into `AppError::Upstream`, keeping the body text.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%status, body = %body, "Mensa API returned an error");
    let message = if body.trim().is_empty() {
        format!("Mensa API responded with {}", status)
    } else {
        format!("Mensa API responded with {}: {}", status, body.trim())
    };
    Err(AppError::Upstream {
        status: Some(status.as_u16()),
        message,
    })
}
