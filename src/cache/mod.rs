//! In-memory response cache with a fixed validity window.
//!
//! Two partitions: a single slot for the canteen list and a map of today's menus
//! keyed by canteen id. Entries are never evicted in the background; a stale entry
//! stays until it is overwritten or invalidated.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Canteen, Menu};

/// Validity window of every cache entry.
pub const CACHE_TTL_MS: i64 = 300_000;

/// A cached value and the time it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Whether the entry is still inside the validity window at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.timestamp) < chrono::Duration::milliseconds(CACHE_TTL_MS)
    }
}

/// Cache lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The canteen list
    Canteens,
    /// Today's menu for a canteen id
    TodayMenu(String),
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Canteens => write!(f, "canteens"),
            CacheKey::TodayMenu(id) => write!(f, "menu:{}", id),
        }
    }
}

/// Invalidation counter observed before a fetch.
///
/// A fetch only stores its result if no invalidation touched its key in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch {
    global: u64,
    key: u64,
}

#[derive(Default)]
struct Partitions {
    canteens: Option<CacheEntry<Arc<Vec<Canteen>>>>,
    menus: HashMap<String, CacheEntry<Arc<Menu>>>,
    /// Bumped by `invalidate_all`
    global_epoch: u64,
    /// Bumped by `invalidate`, reset by `invalidate_all`
    key_epochs: HashMap<CacheKey, u64>,
}

impl Partitions {
    fn epoch(&self, key: &CacheKey) -> Epoch {
        Epoch {
            global: self.global_epoch,
            key: self.key_epochs.get(key).copied().unwrap_or(0),
        }
    }
}

/// Serializable copy of the whole cache, timestamps included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(default)]
    pub canteens: Option<CacheEntry<Vec<Canteen>>>,
    #[serde(default)]
    pub menus: HashMap<String, CacheEntry<Menu>>,
}

/// Process-wide response cache. Construct once and share through an `Arc`.
pub struct CacheStore {
    clock: Arc<dyn Clock>,
    inner: RwLock<Partitions>,
}

impl CacheStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RwLock::new(Partitions::default()),
        }
    }

    /// Cache driven by the system clock.
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// True iff the entry is present and younger than the TTL.
    pub fn is_valid<T>(&self, entry: Option<&CacheEntry<T>>) -> bool {
        entry.is_some_and(|e| e.is_valid_at(self.clock.now()))
    }

    /// Current invalidation epoch for `key`.
    pub async fn epoch(&self, key: &CacheKey) -> Epoch {
        self.inner.read().await.epoch(key)
    }

    pub async fn get_canteens(&self) -> Option<CacheEntry<Arc<Vec<Canteen>>>> {
        self.inner.read().await.canteens.clone()
    }

    pub async fn put_canteens(&self, data: Arc<Vec<Canteen>>) {
        let timestamp = self.clock.now();
        debug!(entries = data.len(), "Caching canteen list");
        self.inner.write().await.canteens = Some(CacheEntry { data, timestamp });
    }

    /// Store the canteen list unless the key was invalidated since `since`.
    pub async fn put_canteens_since(&self, data: Arc<Vec<Canteen>>, since: Epoch) -> bool {
        let timestamp = self.clock.now();
        let mut inner = self.inner.write().await;
        if inner.epoch(&CacheKey::Canteens) != since {
            debug!("Dropping canteen list fetched before an invalidation");
            return false;
        }
        inner.canteens = Some(CacheEntry { data, timestamp });
        true
    }

    pub async fn get_menu(&self, canteen_id: &str) -> Option<CacheEntry<Arc<Menu>>> {
        self.inner.read().await.menus.get(canteen_id).cloned()
    }

    pub async fn put_menu(&self, canteen_id: &str, data: Arc<Menu>) {
        let timestamp = self.clock.now();
        debug!(canteen_id, meals = data.meals.len(), "Caching today's menu");
        self.inner
            .write()
            .await
            .menus
            .insert(canteen_id.to_string(), CacheEntry { data, timestamp });
    }

    /// Store a menu unless its key was invalidated since `since`.
    pub async fn put_menu_since(&self, canteen_id: &str, data: Arc<Menu>, since: Epoch) -> bool {
        let timestamp = self.clock.now();
        let key = CacheKey::TodayMenu(canteen_id.to_string());
        let mut inner = self.inner.write().await;
        if inner.epoch(&key) != since {
            debug!(canteen_id, "Dropping menu fetched before an invalidation");
            return false;
        }
        inner
            .menus
            .insert(canteen_id.to_string(), CacheEntry { data, timestamp });
        true
    }

    /// Valid canteen list, if any.
    pub async fn valid_canteens(&self) -> Option<Arc<Vec<Canteen>>> {
        let entry = self.get_canteens().await;
        if self.is_valid(entry.as_ref()) {
            entry.map(|e| e.data)
        } else {
            None
        }
    }

    /// Valid menu for a canteen, if any.
    pub async fn valid_menu(&self, canteen_id: &str) -> Option<Arc<Menu>> {
        let entry = self.get_menu(canteen_id).await;
        if self.is_valid(entry.as_ref()) {
            entry.map(|e| e.data)
        } else {
            None
        }
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        debug!(%key, "Invalidating cache entry");
        let mut inner = self.inner.write().await;
        *inner.key_epochs.entry(key.clone()).or_default() += 1;
        match key {
            CacheKey::Canteens => inner.canteens = None,
            CacheKey::TodayMenu(id) => {
                inner.menus.remove(id);
            }
        }
    }

    pub async fn invalidate_all(&self) {
        debug!("Invalidating entire cache");
        let mut inner = self.inner.write().await;
        inner.canteens = None;
        inner.menus.clear();
        inner.key_epochs.clear();
        inner.global_epoch += 1;
    }

    /// Number of stored entries, valid or not.
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.menus.len() + usize::from(inner.canteens.is_some())
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Copy the cache contents for persistence.
    pub async fn snapshot(&self) -> CacheSnapshot {
        let inner = self.inner.read().await;
        CacheSnapshot {
            canteens: inner.canteens.as_ref().map(|e| CacheEntry {
                data: e.data.as_ref().clone(),
                timestamp: e.timestamp,
            }),
            menus: inner
                .menus
                .iter()
                .map(|(id, e)| {
                    (
                        id.clone(),
                        CacheEntry {
                            data: e.data.as_ref().clone(),
                            timestamp: e.timestamp,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Replace the cache contents with a snapshot, keeping its timestamps.
    pub async fn restore(&self, snapshot: CacheSnapshot) {
        let mut inner = self.inner.write().await;
        inner.canteens = snapshot.canteens.map(|e| CacheEntry {
            data: Arc::new(e.data),
            timestamp: e.timestamp,
        });
        inner.menus = snapshot
            .menus
            .into_iter()
            .map(|(id, e)| {
                (
                    id,
                    CacheEntry {
                        data: Arc::new(e.data),
                        timestamp: e.timestamp,
                    },
                )
            })
            .collect();
        debug!(
            entries = inner.menus.len() + usize::from(inner.canteens.is_some()),
            "Restored cache snapshot"
        );
    }
}
