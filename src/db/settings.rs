//! Key-value settings: user preferences and the persisted response cache.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::cache::CacheSnapshot;
use crate::errors::AppError;
use crate::models::{format_timestamp, Preferences};

const PREFERENCES_KEY: &str = "preferences";
const CACHE_SNAPSHOT_KEY: &str = "api_cache";

/// JSON values stored by key.
#[derive(Clone)]
pub struct SettingsStore {
    pool: SqlitePool,
}

impl SettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read a value; an undecodable value is reported as absent.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.get("value");
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable setting");
                Ok(None)
            }
        }
    }

    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)?;
        sqlx::query(
            r#"INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(&raw)
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stored preferences, or defaults when nothing was saved yet.
    pub async fn load_preferences(&self) -> Result<Preferences, AppError> {
        Ok(self
            .get_json::<Preferences>(PREFERENCES_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_preferences(&self, preferences: &Preferences) -> Result<(), AppError> {
        self.put_json(PREFERENCES_KEY, preferences).await
    }

    pub async fn load_cache_snapshot(&self) -> Result<Option<CacheSnapshot>, AppError> {
        self.get_json(CACHE_SNAPSHOT_KEY).await
    }

    pub async fn save_cache_snapshot(&self, snapshot: &CacheSnapshot) -> Result<(), AppError> {
        self.put_json(CACHE_SNAPSHOT_KEY, snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheEntry;
    use crate::db::init_database;
    use crate::models::{Menu, PriceCategory};
    use tempfile::TempDir;

    async fn store() -> (TempDir, SettingsStore) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("chat.db"))
            .await
            .expect("Failed to init DB");
        (temp_dir, SettingsStore::new(pool))
    }

    #[tokio::test]
    async fn test_preferences_default_then_saved() {
        let (_dir, store) = store().await;
        assert_eq!(store.load_preferences().await.unwrap(), Preferences::default());

        let prefs = Preferences {
            dark_mode: true,
            price_category: PriceCategory::Guests,
            favorite_canteen: None,
        };
        store.save_preferences(&prefs).await.unwrap();
        store.save_preferences(&prefs).await.unwrap();
        assert_eq!(store.load_preferences().await.unwrap(), prefs);
    }

    #[tokio::test]
    async fn test_unreadable_value_is_absent() {
        let (_dir, store) = store().await;
        store.put_json("preferences", &"not an object").await.unwrap();
        assert_eq!(store.load_preferences().await.unwrap(), Preferences::default());
        assert!(store.remove("preferences").await.unwrap());
        assert!(!store.remove("preferences").await.unwrap());
    }

    #[tokio::test]
    async fn test_cache_snapshot_persists() {
        let (_dir, store) = store().await;
        assert!(store.load_cache_snapshot().await.unwrap().is_none());

        let mut snapshot = CacheSnapshot::default();
        snapshot.menus.insert(
            "x".to_string(),
            CacheEntry {
                data: Menu::empty("x", "2026-10-17"),
                timestamp: Utc::now(),
            },
        );
        store.save_cache_snapshot(&snapshot).await.unwrap();

        let loaded = store.load_cache_snapshot().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }
}
