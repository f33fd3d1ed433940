//! # Purchase Recording
//!
//! Stock-in from a supplier. The batch's average unit cost becomes the
//! product's new cost basis; older stock is not weighted in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::new_id;
use crate::types::{AppState, Purchase};
use crate::validation::{validate_non_negative, validate_quantity};

/// A supplier delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseRequest {
    pub product_id: String,

    pub quantity: i64,

    /// Cost of the whole batch
    pub total_cost: Money,

    #[serde(default)]
    pub supplier: String,

    /// Replaces the product's batch number when non-empty
    #[serde(default)]
    pub batch_number: Option<String>,

    /// Replaces the product's expiry date when non-empty
    #[serde(default)]
    pub expiry_date: Option<String>,
}

/// Non-empty trimmed value, if any.
fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Records a purchase and merges it into the product.
///
/// The record carries the product's batch and expiry as they stand after
/// the merge, so a delivery without a batch number still shows the one
/// on file.
///
/// ## Errors
/// - `Validation` for a non-positive quantity, a negative cost, or a
///   quantity that would overflow the stock count
/// - `ProductNotFound` when the product was deleted
pub fn record_purchase(
    state: &mut AppState,
    request: PurchaseRequest,
    at: DateTime<Utc>,
) -> CoreResult<Purchase> {
    validate_quantity(request.quantity)?;
    validate_non_negative("totalCost", request.total_cost)?;

    let unit_cost = request
        .total_cost
        .divide_by_quantity(request.quantity)
        .ok_or_else(|| ValidationError::positive("quantity"))?;

    let product = state
        .product_mut(&request.product_id)
        .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

    product.stock = product
        .stock
        .checked_add(request.quantity)
        .ok_or_else(|| ValidationError::too_large("quantity"))?;
    product.buy_price = unit_cost;
    if let Some(batch) = supplied(&request.batch_number) {
        product.batch_number = batch.to_string();
    }
    if let Some(expiry) = supplied(&request.expiry_date) {
        product.expiry_date = expiry.to_string();
    }

    let purchase = Purchase {
        id: new_id(),
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity: request.quantity,
        cost: request.total_cost,
        supplier: request.supplier.trim().to_string(),
        batch_number: product.batch_number.clone(),
        expiry_date: product.expiry_date.clone(),
        timestamp: at,
    };

    info!(
        product_id = %purchase.product_id,
        quantity = purchase.quantity,
        cost = %purchase.cost,
        unit_cost = %unit_cost,
        stock = product.stock,
        "Purchase recorded"
    );

    state.purchases.insert(0, purchase.clone());
    Ok(purchase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::{at, product, state_with};

    fn request(product_id: &str, quantity: i64, cost: i64) -> PurchaseRequest {
        PurchaseRequest {
            product_id: product_id.to_string(),
            quantity,
            total_cost: Money::from_minor(cost),
            supplier: "Square Pharma".to_string(),
            batch_number: None,
            expiry_date: None,
        }
    }

    #[test]
    fn test_purchase_replaces_cost_basis() {
        let mut state = state_with(vec![product("a", "Napa", 10, 100, 60)]);

        let purchase = record_purchase(&mut state, request("a", 5, 250), at(1)).unwrap();

        let product = state.product("a").unwrap();
        assert_eq!(product.stock, 15);
        assert_eq!(product.buy_price, Money::from_minor(50));
        assert_eq!(purchase.cost, Money::from_minor(250));
        assert_eq!(purchase.product_name, "Napa");
        assert_eq!(state.purchases.len(), 1);
    }

    #[test]
    fn test_unit_cost_rounds_half_up() {
        let mut state = state_with(vec![product("a", "Napa", 0, 100, 60)]);
        record_purchase(&mut state, request("a", 4, 1002), at(1)).unwrap();
        // 250.5 → 251
        assert_eq!(state.product("a").unwrap().buy_price, Money::from_minor(251));
    }

    #[test]
    fn test_batch_and_expiry_only_when_supplied() {
        let mut state = state_with(vec![product("a", "Napa", 0, 100, 60)]);
        state.products[0].batch_number = "OLD".to_string();
        state.products[0].expiry_date = "2026-01-01".to_string();

        let mut req = request("a", 1, 10);
        req.batch_number = Some("  ".to_string());
        record_purchase(&mut state, req, at(1)).unwrap();
        assert_eq!(state.product("a").unwrap().batch_number, "OLD");
        assert_eq!(state.product("a").unwrap().expiry_date, "2026-01-01");

        let mut req = request("a", 1, 10);
        req.batch_number = Some("B-22".to_string());
        req.expiry_date = Some("2027-06-30".to_string());
        record_purchase(&mut state, req, at(2)).unwrap();
        assert_eq!(state.product("a").unwrap().batch_number, "B-22");
        assert_eq!(state.product("a").unwrap().expiry_date, "2027-06-30");
        assert_eq!(state.purchases[0].batch_number, "B-22");
    }

    #[test]
    fn test_record_falls_back_to_product_batch() {
        let mut state = state_with(vec![product("a", "Napa", 0, 100, 60)]);
        state.products[0].batch_number = "B-9".to_string();
        state.products[0].expiry_date = "2026-12-31".to_string();

        let purchase = record_purchase(&mut state, request("a", 3, 90), at(1)).unwrap();

        assert_eq!(purchase.batch_number, "B-9");
        assert_eq!(purchase.expiry_date, "2026-12-31");
        assert_eq!(state.purchases[0], purchase);
    }

    #[test]
    fn test_stock_overflow_is_rejected() {
        let mut state = state_with(vec![product("a", "Napa", 1, 100, 60)]);
        let before = state.clone();

        assert_eq!(
            record_purchase(&mut state, request("a", i64::MAX, 10), at(1)),
            Err(CoreError::Validation(ValidationError::TooLarge {
                field: "quantity".to_string()
            }))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_purchase_rejections() {
        let mut state = state_with(vec![product("a", "Napa", 0, 100, 60)]);
        let before = state.clone();

        assert_eq!(
            record_purchase(&mut state, request("missing", 1, 10), at(1)),
            Err(CoreError::ProductNotFound("missing".to_string()))
        );
        assert!(matches!(
            record_purchase(&mut state, request("a", 0, 10), at(1)),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            record_purchase(&mut state, request("a", 1, -10), at(1)),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(state, before);
    }
}
