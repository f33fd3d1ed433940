//! # Remote Document Shape
//!
//! What is pushed to and pulled from the owner's remote document: the whole
//! shop minus the fields that only make sense on one device.
//!
//! ## Field Ownership
//! ```text
//! ┌─────────────────────────────┬──────────────┬──────────────────────────┐
//! │ AppState field              │ RemoteSnap   │ On apply                 │
//! ├─────────────────────────────┼──────────────┼──────────────────────────┤
//! │ products, sales, purchases  │ yes          │ replaced wholesale       │
//! │ credits, storeDetails       │ yes          │ replaced wholesale       │
//! │ language                    │ yes          │ replaced                 │
//! │ lastSync                    │ yes          │ replaced (the only clock)│
//! │ linkedEmail                 │ no           │ kept                     │
//! │ isSyncing                   │ no           │ kept                     │
//! └─────────────────────────────┴──────────────┴──────────────────────────┘
//! ```
//!
//! ## Last Writer Wins
//! An incoming document is applied only when this device has never synced
//! or the document's `lastSync` is strictly newer than the local one. Equal
//! or older documents (including the echo of our own push) are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use dokan_core::{AppState, Credit, Language, Product, Purchase, Sale, StoreDetails};

/// The owner's cloud document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteSnapshot {
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
    pub purchases: Vec<Purchase>,
    pub credits: Vec<Credit>,
    pub store_details: StoreDetails,
    pub language: Language,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_sync: Option<DateTime<Utc>>,
}

impl RemoteSnapshot {
    /// Copies the shared part of `state`, stamped with `at`.
    pub fn capture(state: &AppState, at: DateTime<Utc>) -> Self {
        RemoteSnapshot {
            products: state.products.clone(),
            sales: state.sales.clone(),
            purchases: state.purchases.clone(),
            credits: state.credits.clone(),
            store_details: state.store_details.clone(),
            language: state.language,
            last_sync: Some(at),
        }
    }

    /// Whether this document should replace `state`'s shared fields.
    pub fn is_newer_than(&self, state: &AppState) -> bool {
        match (state.last_sync, self.last_sync) {
            (None, _) => true,
            (Some(local), Some(remote)) => remote > local,
            (Some(_), None) => false,
        }
    }

    /// Replaces `state`'s shared fields when this document is newer.
    /// Returns whether anything was applied.
    pub fn apply_to(&self, state: &mut AppState) -> bool {
        if !self.is_newer_than(state) {
            debug!(
                local = ?state.last_sync,
                remote = ?self.last_sync,
                "Ignoring remote snapshot that is not newer"
            );
            return false;
        }

        state.products = self.products.clone();
        state.sales = self.sales.clone();
        state.purchases = self.purchases.clone();
        state.credits = self.credits.clone();
        state.store_details = self.store_details.clone();
        state.language = self.language;
        state.last_sync = self.last_sync;
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
