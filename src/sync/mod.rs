//! Cache-backed data fetching.
//!
//! `DataService` answers "check cache, fetch if stale or missing, populate cache".
//! `resource` holds per-consumer loading/error/data state on top of it, and
//! `reviews` submits reviews straight to the remote API.

pub mod resource;
pub mod reviews;

pub use resource::{CanteenListResource, Resource, ResourceState, TodayMenuResource};
pub use reviews::ReviewSubmitter;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::cache::{CacheKey, CacheStore};
use crate::client::{CanteenQuery, MenuQuery, MensaApiClient};
use crate::errors::AppError;
use crate::models::{Canteen, Menu};

/// Length of a canteen identifier issued by the remote API.
pub const CANTEEN_ID_LEN: usize = 24;

/// Reject identifiers that are not exactly 24 characters long.
pub fn validate_canteen_id(canteen_id: &str) -> Result<(), AppError> {
    if canteen_id.chars().count() == CANTEEN_ID_LEN {
        Ok(())
    } else {
        Err(AppError::invalid_canteen_id())
    }
}

/// Fetches canteens and today's menus through the shared cache.
pub struct DataService {
    client: MensaApiClient,
    cache: Arc<CacheStore>,
    /// One lock per key so overlapping fetches for the same key hit the network once.
    flights: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl DataService {
    pub fn new(client: MensaApiClient, cache: Arc<CacheStore>) -> Self {
        Self {
            client,
            cache,
            flights: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn client(&self) -> &MensaApiClient {
        &self.client
    }

    fn flight(&self, key: CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
        flights.entry(key).or_default().clone()
    }

    /// Forget the lock for `key` once no other caller holds or waits on it.
    fn release_flight(&self, key: &CacheKey, flight: Arc<tokio::sync::Mutex<()>>) {
        let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one here
        if Arc::strong_count(&flight) == 2 {
            flights.remove(key);
        }
    }

    /// Run `fetch` while holding the per-key lock, then drop the lock entry if unused.
    async fn coalesced<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, AppError>>,
    {
        let flight = self.flight(key.clone());
        let result = {
            let _guard = flight.lock().await;
            fetch().await
        };
        self.release_flight(&key, flight);
        result
    }

    #[cfg(test)]
    fn flight_count(&self) -> usize {
        self.flights.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Local calendar date used for "today's menu".
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    // ==================== CANTEENS ====================

    /// Canteen list, served from cache while it is valid.
    pub async fn canteens(&self) -> Result<Arc<Vec<Canteen>>, AppError> {
        if let Some(hit) = self.cache.valid_canteens().await {
            debug!("Canteen list cache hit");
            return Ok(hit);
        }

        self.coalesced(CacheKey::Canteens, move || async move {
            // Another caller may have filled the cache while we waited
            if let Some(hit) = self.cache.valid_canteens().await {
                debug!("Canteen list filled by concurrent fetch");
                return Ok(hit);
            }
            self.load_canteens().await
        })
        .await
    }

    /// Drop the cached list and fetch it again.
    pub async fn refetch_canteens(&self) -> Result<Arc<Vec<Canteen>>, AppError> {
        self.coalesced(CacheKey::Canteens, move || async move {
            self.cache.invalidate(&CacheKey::Canteens).await;
            self.load_canteens().await
        })
        .await
    }

    async fn load_canteens(&self) -> Result<Arc<Vec<Canteen>>, AppError> {
        let epoch = self.cache.epoch(&CacheKey::Canteens).await;
        info!("Fetching canteen list from Mensa API");
        let canteens = Arc::new(self.client.canteens(&CanteenQuery::complete()).await?);
        self.cache.put_canteens_since(canteens.clone(), epoch).await;
        Ok(canteens)
    }

    // ==================== TODAY'S MENU ====================

    /// Today's menu for a canteen, served from cache while it is valid.
    pub async fn today_menu(&self, canteen_id: &str) -> Result<Arc<Menu>, AppError> {
        validate_canteen_id(canteen_id)?;

        if let Some(hit) = self.cache.valid_menu(canteen_id).await {
            debug!(canteen_id, "Menu cache hit");
            return Ok(hit);
        }

        let key = CacheKey::TodayMenu(canteen_id.to_string());
        self.coalesced(key, move || async move {
            if let Some(hit) = self.cache.valid_menu(canteen_id).await {
                debug!(canteen_id, "Menu filled by concurrent fetch");
                return Ok(hit);
            }
            self.load_today_menu(canteen_id).await
        })
        .await
    }

    /// Drop the cached menu for a canteen and fetch it again.
    pub async fn refetch_today_menu(&self, canteen_id: &str) -> Result<Arc<Menu>, AppError> {
        validate_canteen_id(canteen_id)?;

        let key = CacheKey::TodayMenu(canteen_id.to_string());
        self.coalesced(key.clone(), move || async move {
            self.cache.invalidate(&key).await;
            self.load_today_menu(canteen_id).await
        })
        .await
    }

    /// Fetch and cache today's menu. The result is returned but not cached when the
    /// key was invalidated while the request was in flight.
    async fn load_today_menu(&self, canteen_id: &str) -> Result<Arc<Menu>, AppError> {
        let epoch = self
            .cache
            .epoch(&CacheKey::TodayMenu(canteen_id.to_string()))
            .await;
        let today = self.today();
        info!(canteen_id, %today, "Fetching today's menu from Mensa API");

        let menus = self
            .client
            .menus(&MenuQuery::for_day(canteen_id, today))
            .await?;
        let date = today.format("%Y-%m-%d").to_string();
        let menu = menus
            .into_iter()
            .find(|m| m.canteen_id == canteen_id && m.date.starts_with(&date))
            .unwrap_or_else(|| Menu::empty(canteen_id, &date));

        let menu = Arc::new(menu);
        self.cache
            .put_menu_since(canteen_id, menu.clone(), epoch)
            .await;
        Ok(menu)
    }

    /// Global cache reset.
    pub async fn invalidate_all(&self) {
        info!("Clearing response cache");
        self.cache.invalidate_all().await;
    }
}
