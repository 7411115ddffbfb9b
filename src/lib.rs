//! Mensa sync
//!
//! Cached access to a university canteen REST API, review submission, user
//! preferences and a local SQLite chat store, exposed to the app through a
//! small local REST adapter.

pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod sync;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cache::CacheStore;
use client::MensaApiClient;
use config::Config;
use db::{ChatStore, SettingsStore};
use errors::AppError;
use sync::{DataService, ReviewSubmitter};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub data: Arc<DataService>,
    pub reviews: Arc<ReviewSubmitter>,
    pub chats: Arc<ChatStore>,
    pub settings: Arc<SettingsStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire up services. The chat store is only backed by `pool` when chats are enabled.
    pub fn build(
        config: Config,
        pool: SqlitePool,
        cache: Arc<CacheStore>,
    ) -> Result<Self, AppError> {
        let client = MensaApiClient::new(&config.api_base_url, config.api_key.as_deref())?;

        let chats = if config.chat_enabled {
            ChatStore::new(pool.clone())
        } else {
            ChatStore::unavailable()
        };

        Ok(Self {
            data: Arc::new(DataService::new(client.clone(), cache)),
            reviews: Arc::new(ReviewSubmitter::new(client)),
            chats: Arc::new(chats),
            settings: Arc::new(SettingsStore::new(pool)),
            config: Arc::new(config),
        })
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.local_psk.clone();

    let api_routes = Router::new()
        // Cached reads
        .route("/canteens", get(api::list_canteens))
        .route("/canteens/refresh", post(api::refresh_canteens))
        .route("/canteens/{id}/menu/today", get(api::get_today_menu))
        .route(
            "/canteens/{id}/menu/today/refresh",
            post(api::refresh_today_menu),
        )
        .route("/cache", axum::routing::delete(api::clear_cache))
        // Passthrough reads
        .route("/meals", get(api::list_meals))
        .route("/badges", get(api::list_badges))
        .route("/additives", get(api::list_additives))
        // Reviews
        .route(
            "/meals/{id}/reviews",
            get(api::list_meal_reviews).post(api::submit_meal_review),
        )
        .route(
            "/canteens/{id}/reviews",
            get(api::list_canteen_reviews).post(api::submit_canteen_review),
        )
        .route(
            "/meal-reviews/{id}",
            axum::routing::put(api::update_meal_review).delete(api::delete_meal_review),
        )
        .route(
            "/canteen-reviews/{id}",
            axum::routing::put(api::update_canteen_review).delete(api::delete_canteen_review),
        )
        // Chats
        .route("/chats", get(api::list_chats).post(api::create_chat))
        .route("/chats/{id}", get(api::get_chat).delete(api::delete_chat))
        .route(
            "/chats/{id}/messages",
            get(api::list_messages)
                .post(api::post_messages)
                .delete(api::delete_messages),
        )
        // Preferences
        .route(
            "/preferences",
            get(api::get_preferences).put(api::update_preferences),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
