//! # Ledger Engine
//!
//! Every business operation that mutates an [`AppState`]. Each one is a
//! plain synchronous function over `&mut AppState` that either applies in
//! full or returns a [`CoreError`](crate::CoreError) having changed nothing.
//!
//! ## Operations
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────────────┐
//! │ checkout             │ sales ⊕, stock ↓, credit ±                       │
//! │ void_transaction     │ sales ⊖, stock ↑, credit ↓ (floored at 0)        │
//! │ record_purchase      │ purchases ⊕, stock ↑, cost basis replaced        │
//! │ record_payment       │ credit ↓, payment entry                          │
//! │ add/update/delete    │ catalog edits                                    │
//! │ add/update account   │ credit accounts, opening balance                 │
//! │ settings             │ store details, language                          │
//! └──────────────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! ## Four Ledgers, One Rule
//! Stock, sales, purchases and credit balances depend on each other. An
//! operation validates everything it needs first, then mutates; there is no
//! point at which a half-applied operation is visible.

pub mod accounts;
pub mod catalog;
pub mod checkout;
pub mod payment;
pub mod purchase;
pub mod settings;
pub mod void;

pub use accounts::{add_credit_account, update_credit_account};
pub use catalog::{add_product, delete_product, update_product, ProductDraft};
pub use checkout::{checkout, CheckoutItem, CheckoutReceipt, CheckoutRequest};
pub use payment::{record_payment, PaymentReceipt};
pub use purchase::{record_purchase, PurchaseRequest};
pub use settings::{set_language, toggle_language, update_store_details};
pub use void::{void_transaction, VoidReceipt};

use chrono::{DateTime, Duration, Utc};

use crate::types::AppState;

/// First millisecond at or after `at` not already used as a transaction key.
pub(crate) fn free_transaction_timestamp(state: &AppState, at: DateTime<Utc>) -> DateTime<Utc> {
    let mut candidate = at;
    while state.has_transaction(candidate) {
        candidate += Duration::milliseconds(1);
    }
    candidate
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::money::Money;
    use crate::types::{AppState, Product};

    pub fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    pub fn product(id: &str, name: &str, stock: i64, sell: i64, buy: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "Medicine".to_string(),
            unit: "pcs".to_string(),
            buy_price: Money::from_minor(buy),
            sell_price: Money::from_minor(sell),
            stock,
            ..Default::default()
        }
    }

    pub fn state_with(products: Vec<Product>) -> AppState {
        AppState {
            products,
            ..Default::default()
        }
    }
}
