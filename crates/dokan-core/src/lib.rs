//! # dokan-core: Pure Business Logic for Dokan
//!
//! This crate is the **heart** of Dokan. It holds the shop's entire state
//! model and every operation on it as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Dokan Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              External UI / apps/dokan-cli                       │   │
//! │  │   Sales ──► Purchase ──► Due ──► Reports ──► Backup             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           dokan-sync::Shop (lock + notify coordinator)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dokan-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  ledger   │  │allocation │  │  reports  │  │   │
//! │  │   │ AppState  │  │ checkout  │  │ customer  │  │ snapshot  │  │   │
//! │  │   │  Credit   │  │ void, …   │  │validation │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity store (Product, Sale, Purchase, Credit, AppState)
//! - [`money`] - Money type with integer arithmetic
//! - [`allocation`] - Exact proportional split of discount and payment
//! - [`customer`] - Soft customer identity resolution
//! - [`ledger`] - Every state-mutating business operation
//! - [`reports`] - Dashboard, totals, history, search
//! - [`snapshot`] - Backup export/import
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks
//!
//! ## Design Principles
//!
//! 1. **All or nothing**: an operation that returns `Err` changed nothing
//! 2. **No I/O**: the caller supplies the clock (`at`) and owns persistence
//! 3. **Integer Money**: poisha in an i64, never floats
//! 4. **Explicit Errors**: rejections are typed values, never panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use dokan_core::ledger::{add_product, checkout, CheckoutItem, CheckoutRequest, ProductDraft};
//! use dokan_core::{AppState, Money};
//!
//! let mut state = AppState::default();
//! let napa = add_product(&mut state, ProductDraft {
//!     name: "Napa 500mg".into(),
//!     sell_price: Money::from_minor(100),
//!     buy_price: Money::from_minor(60),
//!     stock: 10,
//!     ..Default::default()
//! }).unwrap();
//!
//! let receipt = checkout(
//!     &mut state,
//!     CheckoutRequest::new(vec![CheckoutItem::new(&napa.id, 3)])
//!         .discount(Money::from_minor(30))
//!         .paid(Money::from_minor(200)),
//!     Utc::now(),
//! ).unwrap();
//!
//! assert_eq!(receipt.net, Money::from_minor(270));
//! assert_eq!(receipt.transaction_due, Money::from_minor(70));
//! assert_eq!(state.products[0].stock, 7);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod customer;
pub mod error;
pub mod ledger;
pub mod money;
pub mod reports;
pub mod snapshot;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, SnapshotError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Customer name used when the counter leaves the name blank.
pub const DEFAULT_CUSTOMER_NAME: &str = "Cash Customer";

/// Low-stock alert level for products without their own threshold.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Key of the local persisted record.
pub const STORAGE_KEY: &str = "dokan_v1_data";

/// Shown in place of a product that has been deleted from the catalog.
pub const UNKNOWN_PRODUCT: &str = "unknown product";

/// Fresh entity id (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
