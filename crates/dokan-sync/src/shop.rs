//! # Shop Facade
//!
//! The single entry point an app uses: ledger operations under one write
//! lock, each successful one followed by a nudge to the coordinator.
//!
//! ```text
//!   Shop::checkout(..)
//!       │  write lock ──► ledger::checkout(&mut state, ..) ──► unlock
//!       │
//!       └─ Ok ──► SyncHandle::notify_mutation() ──► save local, debounce push
//!          Err ──► nothing changed, nothing sent
//! ```

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use dokan_core::ledger::{
    self, CheckoutReceipt, CheckoutRequest, PaymentReceipt, ProductDraft, PurchaseRequest,
    VoidReceipt,
};
use dokan_core::reports::{self, DashboardSummary, Totals, TransactionSummary};
use dokan_core::snapshot;
use dokan_core::{
    AppState, CoreResult, Credit, Language, Money, Product, Purchase, SnapshotError, StoreDetails,
};

use crate::auth::Owner;
use crate::config::SyncConfig;
use crate::coordinator::{SyncCoordinator, SyncEventEmitter, SyncHandle, SyncStatus};
use crate::error::SyncResult;
use crate::remote::RemoteDocumentStore;
use crate::store::LocalStore;

/// A running shop: shared state plus its sync coordinator.
#[derive(Clone)]
pub struct Shop {
    state: Arc<RwLock<AppState>>,
    sync: SyncHandle,
}

impl Shop {
    /// Loads the local record (or starts empty) and spawns the coordinator.
    pub async fn open<L, R>(
        store: L,
        remote: R,
        auth_rx: watch::Receiver<Option<Owner>>,
        config: &SyncConfig,
        emitter: Option<Arc<dyn SyncEventEmitter>>,
    ) -> SyncResult<(Shop, JoinHandle<()>)>
    where
        L: LocalStore,
        R: RemoteDocumentStore,
    {
        let mut initial = store.load().await?.unwrap_or_default();
        initial.is_syncing = false;

        info!(
            products = initial.products.len(),
            sales = initial.sales.len(),
            credits = initial.credits.len(),
            "Shop opened"
        );

        let state = Arc::new(RwLock::new(initial));
        let (mut coordinator, sync) =
            SyncCoordinator::new(Arc::clone(&state), store, remote, auth_rx);
        coordinator = coordinator.with_debounce(config.debounce());
        if let Some(emitter) = emitter {
            coordinator = coordinator.with_emitter(emitter);
        }
        let task = coordinator.spawn();

        Ok((Shop { state, sync }, task))
    }

    /// Wraps state already shared with a coordinator.
    pub fn new(state: Arc<RwLock<AppState>>, sync: SyncHandle) -> Self {
        Shop { state, sync }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// A copy of the whole shop.
    pub fn snapshot(&self) -> AppState {
        self.read().clone()
    }

    /// Runs `f` against the current state under the read lock.
    pub fn view<T>(&self, f: impl FnOnce(&AppState) -> T) -> T {
        f(&self.read())
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> DashboardSummary {
        reports::dashboard(&self.read(), now)
    }

    pub fn totals(&self) -> Totals {
        reports::totals(&self.read())
    }

    pub fn transaction_history(&self) -> Vec<TransactionSummary> {
        reports::transaction_history(&self.read())
    }

    pub fn export(&self) -> Result<String, SnapshotError> {
        snapshot::export_snapshot(&self.read())
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    pub fn checkout(&self, request: CheckoutRequest) -> CoreResult<CheckoutReceipt> {
        self.mutate(|state| ledger::checkout(state, request, Utc::now()))
    }

    pub fn void_transaction(&self, timestamp: DateTime<Utc>) -> CoreResult<VoidReceipt> {
        self.mutate(|state| ledger::void_transaction(state, timestamp))
    }

    pub fn record_purchase(&self, request: PurchaseRequest) -> CoreResult<Purchase> {
        self.mutate(|state| ledger::record_purchase(state, request, Utc::now()))
    }

    pub fn record_payment(&self, credit_id: &str, amount: Money) -> CoreResult<PaymentReceipt> {
        self.mutate(|state| ledger::record_payment(state, credit_id, amount, Utc::now()))
    }

    pub fn add_product(&self, draft: ProductDraft) -> CoreResult<Product> {
        self.mutate(|state| ledger::add_product(state, draft))
    }

    pub fn update_product(&self, id: &str, draft: ProductDraft) -> CoreResult<()> {
        self.mutate(|state| ledger::update_product(state, id, draft))
    }

    pub fn delete_product(&self, id: &str) -> CoreResult<Product> {
        self.mutate(|state| ledger::delete_product(state, id))
    }

    pub fn add_credit_account(
        &self,
        name: &str,
        phone: &str,
        opening_balance: Money,
    ) -> CoreResult<Credit> {
        self.mutate(|state| {
            ledger::add_credit_account(state, name, phone, opening_balance, Utc::now())
        })
    }

    pub fn update_credit_account(&self, id: &str, name: &str, phone: &str) -> CoreResult<()> {
        self.mutate(|state| ledger::update_credit_account(state, id, name, phone))
    }

    pub fn update_store_details(&self, details: StoreDetails) -> CoreResult<()> {
        self.mutate(|state| ledger::update_store_details(state, details))
    }

    pub fn set_language(&self, language: Language) {
        ledger::set_language(&mut self.write(), language);
        self.sync.notify_mutation();
    }

    pub fn toggle_language(&self) -> Language {
        let language = ledger::toggle_language(&mut self.write());
        self.sync.notify_mutation();
        language
    }

    /// Replaces the shop with a backup. The owner link and sync stamp are
    /// device facts and survive the restore; on error nothing changes.
    pub fn import(&self, raw: &str) -> Result<(), SnapshotError> {
        let mut restored = snapshot::import_snapshot(raw)?;
        {
            let mut state = self.write();
            restored.linked_email = state.linked_email.take();
            restored.last_sync = state.last_sync;
            *state = restored;
        }
        info!("Shop restored from backup");
        self.sync.notify_mutation();
        Ok(())
    }

    // =========================================================================
    // Sync
    // =========================================================================

    pub async fn sync_now(&self) -> bool {
        self.sync.sync_now().await
    }

    pub async fn sync_status(&self) -> SyncStatus {
        self.sync.status().await
    }

    /// Flushes any pending push and stops the coordinator.
    pub fn shutdown(&self) {
        self.sync.shutdown();
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn mutate<T>(&self, op: impl FnOnce(&mut AppState) -> CoreResult<T>) -> CoreResult<T> {
        let result = op(&mut self.write());
        if result.is_ok() {
            self.sync.notify_mutation();
        }
        result
    }

    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::auth::AuthSession;
    use crate::remote::MemoryRemote;
    use crate::store::MemoryLocalStore;
    use dokan_core::ledger::CheckoutItem;
    use dokan_core::CoreError;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn napa() -> ProductDraft {
        ProductDraft {
            name: "Napa 500mg".to_string(),
            buy_price: Money::from_minor(60),
            sell_price: Money::from_minor(100),
            stock: 10,
            ..Default::default()
        }
    }

    async fn open(store: MemoryLocalStore, remote: MemoryRemote, auth: &AuthSession) -> Shop {
        let (shop, _task) = Shop::open(store, remote, auth.subscribe(), &SyncConfig::default(), None)
            .await
            .unwrap();
        shop
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkout_is_saved_locally() {
        let store = MemoryLocalStore::new();
        let auth = AuthSession::new();
        let shop = open(store.clone(), MemoryRemote::new(), &auth).await;

        let product = shop.add_product(napa()).unwrap();
        let receipt = shop
            .checkout(
                CheckoutRequest::new(vec![CheckoutItem::new(&product.id, 3)])
                    .discount(Money::from_minor(30))
                    .paid(Money::from_minor(200)),
            )
            .unwrap();
        settle().await;

        assert_eq!(receipt.transaction_due, Money::from_minor(70));
        let saved = store.current().unwrap();
        assert_eq!(saved.products[0].stock, 7);
        assert_eq!(saved.sales.len(), 1);
        assert_eq!(store.save_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_operation_is_not_saved() {
        let store = MemoryLocalStore::new();
        let auth = AuthSession::new();
        let shop = open(store.clone(), MemoryRemote::new(), &auth).await;

        let err = shop
            .checkout(CheckoutRequest::new(vec![CheckoutItem::new("missing", 1)]))
            .unwrap_err();
        settle().await;

        assert_eq!(err, CoreError::ProductNotFound("missing".to_string()));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_resumes_local_record() {
        let mut previous = AppState::default();
        previous.language = Language::Bn;
        previous.is_syncing = true;
        let store = MemoryLocalStore::with_state(previous);
        let auth = AuthSession::new();

        let shop = open(store, MemoryRemote::new(), &auth).await;

        let state = shop.snapshot();
        assert_eq!(state.language, Language::Bn);
        assert!(!state.is_syncing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_changes_reach_owner_document_after_debounce() {
        let remote = MemoryRemote::new();
        let auth = AuthSession::new();
        auth.sign_in(Owner::new("u1", "owner@example.com"));
        let shop = open(MemoryLocalStore::new(), remote.clone(), &auth).await;
        settle().await;

        shop.add_product(napa()).unwrap();
        shop.toggle_language();
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(remote.write_count(), 1);
        let document = remote.document("u1").unwrap();
        assert_eq!(document.products.len(), 1);
        assert_eq!(document.language, Language::Bn);
        assert_eq!(shop.sync_status().await.pushes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_keeps_owner_link() {
        let auth = AuthSession::new();
        auth.sign_in(Owner::new("u1", "owner@example.com"));
        let shop = open(MemoryLocalStore::new(), MemoryRemote::new(), &auth).await;
        settle().await;

        shop.import(r#"{"products": [{"id": "p9", "name": "Sergel"}], "sales": []}"#)
            .unwrap();

        let state = shop.snapshot();
        assert_eq!(state.products[0].name, "Sergel");
        assert_eq!(state.linked_email.as_deref(), Some("owner@example.com"));

        assert!(shop.import(r#"{"products": []}"#).is_err());
        assert_eq!(shop.snapshot().products.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_then_reports() {
        let auth = AuthSession::new();
        let shop = open(MemoryLocalStore::new(), MemoryRemote::new(), &auth).await;
        shop.add_product(napa()).unwrap();

        let exported = shop.export().unwrap();
        assert!(exported.contains("Napa 500mg"));
        assert_eq!(shop.totals().stock_value, Money::from_minor(600));
        assert!(shop.view(|s| s.products.len()) == 1);
    }
}
