//! # Domain Types
//!
//! The entity store: every collection the shop owns, as plain data.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AppState (aggregate root)                       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Purchase     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  one line of a  │   │  immutable      │       │
//! │  │  stock          │   │  transaction    │   │  total cost     │       │
//! │  │  buy/sell price │   │  keyed by       │   │  of the batch   │       │
//! │  │  expiry         │   │  timestamp      │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Credit       │   │  StoreDetails   │   │    Language     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  totalDue       │   │  name, phone    │   │  En | Bn        │       │
//! │  │  history[] ─────┼─► │  address, logo  │   └─────────────────┘       │
//! │  │  CreditEntry    │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  + linkedEmail, lastSync (sync clock), isSyncing (transient)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Shape
//! The serialized form is camelCase JSON with timestamps as epoch
//! milliseconds. The same shape is used for the local record, the remote
//! document and backup files, so renaming a field here is a format change.
//!
//! Fields written as `null` (older backups serialize unset values that way)
//! read back as the field's default.
//!
//! ## Dangling References
//! History rows (`Sale`, `Purchase`) keep the `product_id` they were created
//! with. Deleting a product does not touch them; readers resolve a missing
//! product as "unknown product".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::DEFAULT_LOW_STOCK_THRESHOLD;

// =============================================================================
// Product
// =============================================================================

/// A product in the shop's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4)
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(deserialize_with = "null_as_default")]
    pub category: String,

    #[serde(deserialize_with = "null_as_default")]
    pub batch_number: String,

    /// Selling unit ("pcs", "strip", "box")
    #[serde(deserialize_with = "null_as_default")]
    pub unit: String,

    /// Unit cost basis. Replaced outright by the latest purchase.
    pub buy_price: Money,

    pub sell_price: Money,

    /// Units on hand. Checkout never drives this below zero; direct edits
    /// are not checked.
    #[serde(deserialize_with = "null_as_default")]
    pub stock: i64,

    /// Free-form `YYYY-MM-DD`. Empty when unknown.
    #[serde(deserialize_with = "null_as_default")]
    pub expiry_date: String,

    /// Low-stock alert level. Zero means "use the shop default".
    #[serde(deserialize_with = "null_as_default")]
    pub low_stock_threshold: i64,
}

impl Product {
    /// Threshold used by the low-stock report.
    pub fn effective_threshold(&self) -> i64 {
        if self.low_stock_threshold > 0 {
            self.low_stock_threshold
        } else {
            DEFAULT_LOW_STOCK_THRESHOLD
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.effective_threshold()
    }

    /// Stock valued at the current cost basis.
    pub fn stock_value(&self) -> Money {
        self.buy_price.multiply_quantity(self.stock)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One line of a checkout.
///
/// ## Transaction Grouping
/// All lines of one checkout share `timestamp`; that shared value is the
/// transaction key used by void and by the history report.
///
/// ## Line Invariants
/// ```text
/// total == quantity × sell_price − discount
/// total == paid_amount + due_amount
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,

    pub product_id: String,

    /// Product name at sale time
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,

    pub quantity: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,

    /// Snapshotted at sale time
    pub sell_price: Money,

    /// Snapshotted at sale time
    pub buy_price: Money,

    /// Line net: gross minus this line's discount share
    pub total: Money,

    /// This line's share of the transaction discount
    pub discount: Money,

    /// This line's share of the tendered amount
    pub paid_amount: Money,

    pub due_amount: Money,

    /// Customer balance before this transaction
    #[serde(default)]
    pub previous_balance: Money,

    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_phone: String,

    pub profit: Money,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub timestamp: DateTime<Utc>,
}

impl Sale {
    /// Line value before discount.
    pub fn gross(&self) -> Money {
        self.sell_price.multiply_quantity(self.quantity)
    }

    /// Checks both line invariants.
    pub fn is_consistent(&self) -> bool {
        self.total == self.gross() - self.discount
            && self.total == self.paid_amount + self.due_amount
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// A stock-in record. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Purchase {
    pub id: String,

    pub product_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,

    pub quantity: i64,

    /// Total cost of the batch (not unit cost)
    pub cost: Money,

    #[serde(default, deserialize_with = "null_as_default")]
    pub supplier: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub batch_number: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub expiry_date: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Credit (customer account)
// =============================================================================

/// Direction of a credit ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum EntryKind {
    /// Customer took goods on credit (balance goes up)
    Purchase,
    /// Customer paid (balance goes down)
    Payment,
}

/// One row of a customer's credit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditEntry {
    pub id: String,

    /// Always non-negative; direction comes from `kind`.
    pub amount: Money,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default)]
    pub related_sale_id: Option<String>,
}

impl CreditEntry {
    /// Signed effect on the balance.
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            EntryKind::Purchase => self.amount,
            EntryKind::Payment => -self.amount,
        }
    }
}

/// A customer account ("baki khata").
///
/// ## Balance Rule
/// ```text
/// total_due == Σ purchase entries − Σ payment entries
/// ```
/// The balance is stored redundantly next to the history; every ledger
/// operation goes through [`Credit::post`] so both move together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Credit {
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_phone: String,

    /// Signed running balance. Positive means the customer owes the shop.
    pub total_due: Money,

    /// Newest first
    #[serde(default)]
    pub history: Vec<CreditEntry>,
}

impl Credit {
    /// Balance recomputed from history alone.
    pub fn recomputed_due(&self) -> Money {
        self.history.iter().map(CreditEntry::signed_amount).sum()
    }

    /// True when the stored balance agrees with the history.
    pub fn is_balanced(&self) -> bool {
        self.total_due == self.recomputed_due()
    }

    /// Timestamp of the newest history entry.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.history.iter().map(|e| e.timestamp).max()
    }

    /// Applies a signed balance change and prepends the matching entry.
    ///
    /// Positive `delta` posts a `purchase`, negative posts a `payment`.
    /// A zero delta is a no-op and returns `None`.
    pub fn post(
        &mut self,
        delta: Money,
        at: DateTime<Utc>,
        note: impl Into<String>,
        related_sale_id: Option<String>,
    ) -> Option<&CreditEntry> {
        if delta.is_zero() {
            return None;
        }

        let kind = if delta.is_positive() {
            EntryKind::Purchase
        } else {
            EntryKind::Payment
        };

        self.total_due += delta;
        self.history.insert(
            0,
            CreditEntry {
                id: crate::new_id(),
                amount: delta.abs(),
                kind,
                timestamp: at,
                note: Some(note.into()),
                related_sale_id,
            },
        );
        self.history.first()
    }
}

// =============================================================================
// Store Details & Language
// =============================================================================

/// Shop header printed on receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct StoreDetails {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    /// Embedded image as a data URL
    pub logo: Option<String>,
}

impl Default for StoreDetails {
    fn default() -> Self {
        Self {
            name: "MY SHOP".to_string(),
            phone: "01XXXXXXXXX".to_string(),
            address: "Street Address, City".to_string(),
            logo: None,
        }
    }
}

/// UI language preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Language {
    #[default]
    En,
    Bn,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Bn,
            Language::Bn => Language::En,
        }
    }
}

// =============================================================================
// AppState
// =============================================================================

/// The aggregate root: unit of persistence and of sync.
///
/// ## Field Ownership
/// ```text
/// ┌──────────────────────────┬───────────────────────────────────────────┐
/// │ products … language      │ replicated (local record + remote doc)    │
/// │ last_sync                │ replicated, the only sync clock           │
/// │ linked_email             │ local record only                         │
/// │ is_syncing               │ in memory only, never serialized          │
/// └──────────────────────────┴───────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct AppState {
    pub products: Vec<Product>,

    /// Newest first
    pub sales: Vec<Sale>,

    /// Newest first
    pub purchases: Vec<Purchase>,

    pub credits: Vec<Credit>,

    pub store_details: StoreDetails,

    pub language: Language,

    pub linked_email: Option<String>,

    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    #[ts(type = "number | null")]
    pub last_sync: Option<DateTime<Utc>>,

    #[serde(skip)]
    #[ts(skip)]
    pub is_syncing: bool,
}

impl AppState {
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    pub fn credit(&self, id: &str) -> Option<&Credit> {
        self.credits.iter().find(|c| c.id == id)
    }

    pub fn credit_mut(&mut self, id: &str) -> Option<&mut Credit> {
        self.credits.iter_mut().find(|c| c.id == id)
    }

    /// All lines of the transaction keyed by `timestamp`.
    pub fn transaction(&self, timestamp: DateTime<Utc>) -> impl Iterator<Item = &Sale> {
        self.sales.iter().filter(move |s| s.timestamp == timestamp)
    }

    /// True when some sale already uses this transaction key.
    pub fn has_transaction(&self, timestamp: DateTime<Utc>) -> bool {
        self.sales.iter().any(|s| s.timestamp == timestamp)
    }
}

/// Reads `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_default_state() {
        let state = AppState::default();
        assert_eq!(state.store_details.name, "MY SHOP");
        assert_eq!(state.language, Language::En);
        assert!(state.last_sync.is_none());
        assert!(state.products.is_empty());
    }

    #[test]
    fn test_effective_threshold() {
        let mut product = Product {
            stock: 10,
            ..Default::default()
        };
        assert_eq!(product.effective_threshold(), 10);
        assert!(product.is_low_stock());

        product.low_stock_threshold = 5;
        assert!(!product.is_low_stock());
    }

    #[test]
    fn test_credit_post_keeps_balance() {
        let mut credit = Credit {
            id: "c1".to_string(),
            customer_name: "Rahim".to_string(),
            customer_phone: String::new(),
            total_due: Money::zero(),
            history: vec![],
        };

        credit.post(Money::from_minor(5000), ts(1), "first", None);
        credit.post(Money::from_minor(-2000), ts(2), "second", None);
        assert!(credit.post(Money::zero(), ts(3), "noop", None).is_none());

        assert_eq!(credit.total_due, Money::from_minor(3000));
        assert_eq!(credit.history.len(), 2);
        assert_eq!(credit.history[0].kind, EntryKind::Payment);
        assert_eq!(credit.history[0].amount, Money::from_minor(2000));
        assert_eq!(credit.history[1].kind, EntryKind::Purchase);
        assert!(credit.is_balanced());
        assert_eq!(credit.last_activity(), Some(ts(2)));
    }

    #[test]
    fn test_wire_shape_is_camel_case_with_millis() {
        let mut state = AppState::default();
        state.last_sync = Some(ts(1_700_000_000_000));
        state.is_syncing = true;
        state.credits.push(Credit {
            id: "c1".to_string(),
            customer_name: "Karim".to_string(),
            customer_phone: "017".to_string(),
            total_due: Money::from_minor(150),
            history: vec![CreditEntry {
                id: "e1".to_string(),
                amount: Money::from_minor(150),
                kind: EntryKind::Purchase,
                timestamp: ts(5),
                note: None,
                related_sale_id: None,
            }],
        });

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["lastSync"], 1_700_000_000_000i64);
        assert_eq!(json["storeDetails"]["name"], "MY SHOP");
        assert_eq!(json["language"], "en");
        assert_eq!(json["credits"][0]["totalDue"], 1.5);
        assert_eq!(json["credits"][0]["history"][0]["type"], "purchase");
        assert_eq!(json["credits"][0]["history"][0]["timestamp"], 5);
        assert!(json["credits"][0]["history"][0]["note"].is_null());
        assert!(json.get("isSyncing").is_none());
    }

    #[test]
    fn test_missing_fields_fill_from_defaults() {
        let state: AppState = serde_json::from_str(r#"{"products":[],"sales":[]}"#).unwrap();
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        let product: Product = serde_json::from_str(
            r#"{"id":"p1","name":"Napa","category":null,"batchNumber":null,
                "expiryDate":null,"unit":null,"stock":null,"lowStockThreshold":null,
                "buyPrice":null,"sellPrice":12}"#,
        )
        .unwrap();
        assert_eq!(product.category, "");
        assert_eq!(product.batch_number, "");
        assert_eq!(product.expiry_date, "");
        assert_eq!(product.stock, 0);
        assert_eq!(product.low_stock_threshold, 0);
        assert!(product.buy_price.is_zero());
        assert_eq!(product.sell_price, Money::from_major(12));

        let purchase: Purchase = serde_json::from_str(
            r#"{"id":"u1","productId":"p1","productName":"Napa","quantity":5,"cost":250,
                "supplier":null,"batchNumber":null,"expiryDate":null,"timestamp":7}"#,
        )
        .unwrap();
        assert_eq!(purchase.supplier, "");
        assert_eq!(purchase.cost, Money::from_major(250));
    }
}
