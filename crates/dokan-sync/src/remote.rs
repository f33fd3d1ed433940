//! # Remote Document Store
//!
//! One document per owner, written whole and observed through a watch
//! channel. A watch channel only ever holds the newest value, which is all a
//! last-writer-wins reader needs.
//!
//! ```text
//! ┌────────────────┐  write(owner, snapshot)   ┌──────────────────────────┐
//! │  Coordinator   │ ────────────────────────► │  owners/{uid} document   │
//! │                │ ◄──────────────────────── │                          │
//! └────────────────┘  subscribe(owner) → rx    └──────────────────────────┘
//!                     (current value first,
//!                      then every change)
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::auth::Owner;
use crate::error::{SyncError, SyncResult};
use crate::protocol::RemoteSnapshot;

/// A per-owner document store.
pub trait RemoteDocumentStore: Send + Sync + 'static {
    /// Replaces the owner's document.
    fn write(
        &self,
        owner: &Owner,
        snapshot: RemoteSnapshot,
    ) -> impl Future<Output = SyncResult<()>> + Send;

    /// Observes the owner's document. The receiver's current value is the
    /// document as it stands now (`None` if it has never been written).
    fn subscribe(&self, owner: &Owner) -> watch::Receiver<Option<RemoteSnapshot>>;
}

// =============================================================================
// Memory Remote
// =============================================================================

/// In-process remote used by tests and offline sessions. Clones share
/// documents, so two coordinators holding clones behave like two devices.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<MemoryRemoteInner>,
}

#[derive(Debug, Default)]
struct MemoryRemoteInner {
    documents: Mutex<HashMap<String, watch::Sender<Option<RemoteSnapshot>>>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    write_delay: Mutex<Option<Duration>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail until switched off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every following write take `delay` before landing.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *lock(&self.inner.write_delay) = delay;
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// The owner's current document.
    pub fn document(&self, uid: &str) -> Option<RemoteSnapshot> {
        lock(&self.inner.documents)
            .get(uid)
            .and_then(|tx| tx.borrow().clone())
    }

    /// Writes a document as if another device had pushed it.
    pub fn put(&self, uid: &str, snapshot: RemoteSnapshot) {
        self.sender(uid).send_replace(Some(snapshot));
    }

    fn sender(&self, uid: &str) -> watch::Sender<Option<RemoteSnapshot>> {
        lock(&self.inner.documents)
            .entry(uid.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .clone()
    }
}

impl RemoteDocumentStore for MemoryRemote {
    async fn write(&self, owner: &Owner, snapshot: RemoteSnapshot) -> SyncResult<()> {
        let delay = *lock(&self.inner.write_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteWriteFailed("write rejected".into()));
        }

        debug!(uid = %owner.uid, last_sync = ?snapshot.last_sync, "Remote document written");
        self.sender(&owner.uid).send_replace(Some(snapshot));
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self, owner: &Owner) -> watch::Receiver<Option<RemoteSnapshot>> {
        self.sender(&owner.uid).subscribe()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_subscriber_sees_current_then_new() {
        let remote = MemoryRemote::new();
        let owner = Owner::new("u1", "owner@example.com");

        let mut rx = remote.subscribe(&owner);
        assert!(rx.borrow_and_update().is_none());

        let snapshot = RemoteSnapshot {
            last_sync: Some(Utc::now()),
            ..Default::default()
        };
        remote.write(&owner, snapshot.clone()).await.unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&snapshot));
        assert_eq!(remote.write_count(), 1);
        assert_eq!(remote.document("u1"), Some(snapshot));
    }

    #[tokio::test]
    async fn test_failed_write_changes_nothing() {
        let remote = MemoryRemote::new();
        let owner = Owner::new("u1", "owner@example.com");
        remote.set_fail_writes(true);

        let err = remote
            .write(&owner, RemoteSnapshot::default())
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(remote.write_count(), 0);
        assert!(remote.document("u1").is_none());
    }

    #[tokio::test]
    async fn test_documents_are_per_owner() {
        let remote = MemoryRemote::new();
        remote.put("u1", RemoteSnapshot::default());

        assert!(remote.document("u1").is_some());
        assert!(remote.document("u2").is_none());
    }
}
