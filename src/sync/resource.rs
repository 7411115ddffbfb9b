//! Loading/error/data state for a single consumer of the data service.
//!
//! A `Resource` only accepts the result of the most recent request, and ignores
//! everything once it has been disposed.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{validate_canteen_id, DataService};
use crate::errors::AppError;
use crate::models::{Canteen, Menu};

/// Snapshot of a consumer's view of one resource.
#[derive(Debug)]
pub struct ResourceState<T> {
    pub data: Option<Arc<T>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> Clone for ResourceState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

pub struct Resource<T> {
    state: RwLock<ResourceState<T>>,
    generation: AtomicU64,
    disposed: AtomicBool,
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Resource<T> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ResourceState::default()),
            generation: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> ResourceState<T> {
        self.state.read().await.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Stop accepting updates. Requests still in flight complete but are not applied.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.is_disposed() && self.generation.load(Ordering::Acquire) == generation
    }

    /// Surface data without a request, cancelling whatever is in flight.
    pub async fn set_data(&self, data: Arc<T>) {
        let generation = self.begin();
        if self.is_current(generation) {
            let mut state = self.state.write().await;
            state.data = Some(data);
            state.loading = false;
            state.error = None;
        }
    }

    /// Surface an error without a request, keeping the previous data.
    pub async fn set_error(&self, error: &AppError) {
        let generation = self.begin();
        if self.is_current(generation) {
            let mut state = self.state.write().await;
            state.loading = false;
            state.error = Some(error.message());
        }
    }

    /// Reset to the empty state without an error.
    pub async fn clear(&self) {
        let generation = self.begin();
        if self.is_current(generation) {
            *self.state.write().await = ResourceState::default();
        }
    }

    /// Run a fetch and apply its outcome if it is still the latest request.
    ///
    /// On failure the previous data is kept and `error` holds the message.
    pub async fn run<F>(&self, fetch: F) -> Result<Arc<T>, AppError>
    where
        F: Future<Output = Result<Arc<T>, AppError>>,
    {
        let generation = self.begin();
        if self.is_current(generation) {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = fetch.await;

        if self.is_current(generation) {
            let mut state = self.state.write().await;
            state.loading = false;
            match &result {
                Ok(data) => state.data = Some(data.clone()),
                Err(err) => state.error = Some(err.message()),
            }
        } else {
            tracing::debug!(generation, "Discarding superseded or disposed result");
        }

        result
    }
}

/// Canteen list bound to one consumer.
pub struct CanteenListResource {
    service: Arc<DataService>,
    resource: Resource<Vec<Canteen>>,
}

impl CanteenListResource {
    pub fn new(service: Arc<DataService>) -> Self {
        Self {
            service,
            resource: Resource::new(),
        }
    }

    /// Initial load: a valid cache entry is surfaced without a request.
    pub async fn load(&self) -> ResourceState<Vec<Canteen>> {
        match self.service.cache().valid_canteens().await {
            Some(hit) => self.resource.set_data(hit).await,
            None => {
                let _ = self.resource.run(self.service.canteens()).await;
            }
        }
        self.resource.state().await
    }

    /// Forced network round trip.
    pub async fn refetch(&self) -> ResourceState<Vec<Canteen>> {
        let _ = self.resource.run(self.service.refetch_canteens()).await;
        self.resource.state().await
    }

    pub async fn state(&self) -> ResourceState<Vec<Canteen>> {
        self.resource.state().await
    }

    pub fn dispose(&self) {
        self.resource.dispose();
    }
}

/// Today's menu for an optional canteen, bound to one consumer.
pub struct TodayMenuResource {
    service: Arc<DataService>,
    canteen_id: Option<String>,
    resource: Resource<Menu>,
}

impl TodayMenuResource {
    pub fn new(service: Arc<DataService>, canteen_id: Option<String>) -> Self {
        Self {
            service,
            canteen_id,
            resource: Resource::new(),
        }
    }

    pub async fn load(&self) -> ResourceState<Menu> {
        let Some(canteen_id) = self.canteen_id.as_deref() else {
            self.resource.clear().await;
            return self.resource.state().await;
        };

        if let Err(err) = validate_canteen_id(canteen_id) {
            self.resource.set_error(&err).await;
            return self.resource.state().await;
        }

        match self.service.cache().valid_menu(canteen_id).await {
            Some(hit) => self.resource.set_data(hit).await,
            None => {
                let _ = self.resource.run(self.service.today_menu(canteen_id)).await;
            }
        }
        self.resource.state().await
    }

    pub async fn refetch(&self) -> ResourceState<Menu> {
        let Some(canteen_id) = self.canteen_id.as_deref() else {
            self.resource.clear().await;
            return self.resource.state().await;
        };

        let _ = self
            .resource
            .run(self.service.refetch_today_menu(canteen_id))
            .await;
        self.resource.state().await
    }

    pub async fn state(&self) -> ResourceState<Menu> {
        self.resource.state().await
    }

    /// Drop this consumer's cache entry and stop accepting updates.
    pub async fn dispose(&self) {
        self.resource.dispose();
        if let Some(id) = &self.canteen_id {
            self.service
                .cache()
                .invalidate(&crate::cache::CacheKey::TodayMenu(id.clone()))
                .await;
        }
    }
}
