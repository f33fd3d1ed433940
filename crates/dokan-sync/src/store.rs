//! # Local Store Seam
//!
//! Where the coordinator writes the local record after every mutation.
//! [`Database`] is the real implementation; [`MemoryLocalStore`] keeps the
//! record in memory for tests and throwaway sessions.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use dokan_core::AppState;
use dokan_db::Database;

use crate::error::SyncResult;

/// Persistence for the single local record.
pub trait LocalStore: Send + Sync + 'static {
    /// The stored state, or `None` when nothing usable is stored.
    fn load(&self) -> impl Future<Output = SyncResult<Option<AppState>>> + Send;

    /// Replaces the stored state.
    fn save(&self, state: &AppState) -> impl Future<Output = SyncResult<()>> + Send;
}

// =============================================================================
// SQLite
// =============================================================================

/// The SQLite record under a fixed key.
#[derive(Debug, Clone)]
pub struct SqliteLocalStore {
    db: Database,
    key: String,
}

impl SqliteLocalStore {
    pub fn new(db: Database, key: impl Into<String>) -> Self {
        SqliteLocalStore { db, key: key.into() }
    }
}

impl LocalStore for SqliteLocalStore {
    async fn load(&self) -> SyncResult<Option<AppState>> {
        Ok(self.db.snapshots().load_state(&self.key).await?)
    }

    async fn save(&self, state: &AppState) -> SyncResult<()> {
        Ok(self.db.snapshots().save_state(&self.key, state).await?)
    }
}

// =============================================================================
// Memory
// =============================================================================

/// In-memory record. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStore {
    inner: Arc<Mutex<MemoryRecord>>,
}

#[derive(Debug, Default)]
struct MemoryRecord {
    state: Option<AppState>,
    saves: usize,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `state`.
    pub fn with_state(state: AppState) -> Self {
        let store = Self::default();
        store.lock().state = Some(state);
        store
    }

    /// The last saved state.
    pub fn current(&self) -> Option<AppState> {
        self.lock().state.clone()
    }

    /// How many times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryRecord> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStore for MemoryLocalStore {
    async fn load(&self) -> SyncResult<Option<AppState>> {
        Ok(self.lock().state.clone())
    }

    async fn save(&self, state: &AppState) -> SyncResult<()> {
        let mut record = self.lock();
        record.state = Some(state.clone());
        record.saves += 1;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dokan_core::{Language, STORAGE_KEY};
    use dokan_db::DbConfig;

    #[tokio::test]
    async fn test_sqlite_store_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = SqliteLocalStore::new(db, STORAGE_KEY);

        assert!(store.load().await.unwrap().is_none());

        let state = AppState {
            language: Language::Bn,
            ..Default::default()
        };
        store.save(&state).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_memory_store_counts_saves() {
        let store = MemoryLocalStore::new();
        store.save(&AppState::default()).await.unwrap();
        store.save(&AppState::default()).await.unwrap();

        assert_eq!(store.save_count(), 2);
        assert!(store.clone().current().is_some());
    }
}
