//! # Snapshot Repository
//!
//! Reads and writes the single JSON document that holds the shop.
//!
//! ## Record Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  startup        load_state(key) ──► Some(AppState) | None              │
//! │                                          │            │                │
//! │                                          │            └─ fresh shop    │
//! │                                          ▼                              │
//! │  every change   save_state(key, &state)  (upsert, whole document)      │
//! │                                                                         │
//! │  corrupt JSON   load_state → None + warn!  (record left in place)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, TimeZone, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbResult;
use dokan_core::AppState;

/// Repository for snapshot records.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    /// Creates a new SnapshotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SnapshotRepository { pool }
    }

    /// Raw payload stored under `key`.
    pub async fn load_raw(&self, key: &str) -> DbResult<Option<String>> {
        let row = sqlx::query("SELECT payload FROM snapshots WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<String, _>("payload")))
    }

    /// Upserts a raw payload under `key`.
    pub async fn save_raw(&self, key: &str, payload: &str, updated_at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO snapshots (key, payload, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(payload)
        .bind(updated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        debug!(key = %key, bytes = payload.len(), "Snapshot saved");
        Ok(())
    }

    /// Decoded state under `key`.
    ///
    /// Returns `Ok(None)` both when nothing is stored and when the stored
    /// payload no longer decodes; the latter is logged.
    pub async fn load_state(&self, key: &str) -> DbResult<Option<AppState>> {
        let Some(payload) = self.load_raw(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<AppState>(&payload) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored snapshot is corrupt; starting fresh");
                Ok(None)
            }
        }
    }

    /// Writes the whole state under `key`.
    pub async fn save_state(&self, key: &str, state: &AppState) -> DbResult<()> {
        let payload = serde_json::to_string(state)?;
        self.save_raw(key, &payload, Utc::now()).await
    }

    /// When `key` was last written.
    pub async fn updated_at(&self, key: &str) -> DbResult<Option<DateTime<Utc>>> {
        let millis: Option<i64> =
            sqlx::query_scalar("SELECT updated_at FROM snapshots WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(millis.and_then(|ms| Utc.timestamp_millis_opt(ms).single()))
    }

    /// Removes the record. Returns whether one existed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM snapshots WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use dokan_core::{AppState, Language, Money, Product, STORAGE_KEY};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sample_state() -> AppState {
        AppState {
            products: vec![Product {
                id: "p1".to_string(),
                name: "Napa".to_string(),
                sell_price: Money::from_minor(100),
                stock: 10,
                ..Default::default()
            }],
            language: Language::Bn,
            linked_email: Some("owner@example.com".to_string()),
            is_syncing: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_missing_record_loads_none() {
        let db = db().await;
        assert!(db.snapshots().load_state(STORAGE_KEY).await.unwrap().is_none());
        assert!(db.snapshots().updated_at(STORAGE_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let db = db().await;
        let repo = db.snapshots();
        let state = sample_state();

        repo.save_state(STORAGE_KEY, &state).await.unwrap();
        let loaded = repo.load_state(STORAGE_KEY).await.unwrap().unwrap();

        assert_eq!(loaded.products, state.products);
        assert_eq!(loaded.language, Language::Bn);
        assert_eq!(loaded.linked_email, state.linked_email);
        assert!(!loaded.is_syncing);
        assert!(repo.updated_at(STORAGE_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let db = db().await;
        let repo = db.snapshots();
        let mut state = sample_state();

        repo.save_state(STORAGE_KEY, &state).await.unwrap();
        state.products.clear();
        repo.save_state(STORAGE_KEY, &state).await.unwrap();

        let loaded = repo.load_state(STORAGE_KEY).await.unwrap().unwrap();
        assert!(loaded.products.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_payload_loads_none() {
        let db = db().await;
        let repo = db.snapshots();

        repo.save_raw(STORAGE_KEY, "{not json", chrono::Utc::now())
            .await
            .unwrap();

        assert!(repo.load_state(STORAGE_KEY).await.unwrap().is_none());
        // the raw record is left for inspection
        assert_eq!(
            repo.load_raw(STORAGE_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let db = db().await;
        let repo = db.snapshots();

        repo.save_state(STORAGE_KEY, &sample_state()).await.unwrap();
        assert!(repo.delete(STORAGE_KEY).await.unwrap());
        assert!(!repo.delete(STORAGE_KEY).await.unwrap());
        assert!(repo.load_state(STORAGE_KEY).await.unwrap().is_none());
    }
}
