//! # Sale Void
//!
//! Compensating action for a checkout: puts stock back, takes the
//! transaction's due off the customer's balance and deletes the lines.
//!
//! This is not a true reversal. If the account moved for unrelated reasons
//! between sale and void, the floor at zero can swallow part of the
//! correction; the receipt reports how much.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::customer::resolve_customer;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{AppState, CreditEntry, EntryKind};

/// Outcome of [`void_transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VoidReceipt {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub timestamp: DateTime<Utc>,

    /// Sale lines removed
    pub removed_lines: usize,

    /// Lines whose stock went back to a product
    pub restored_lines: usize,

    /// Lines whose product no longer exists
    pub skipped_lines: usize,

    pub credit_id: Option<String>,

    /// Balance change actually taken off the account
    pub reversed_due: Money,

    /// Part of the group's due the zero floor swallowed
    pub absorbed_by_floor: Money,
}

/// Voids the transaction keyed by `timestamp`.
///
/// Credit entries are removed when their `related_sale_id` names one of the
/// group's lines. Entries without a sale link are removed only if they are
/// purchases stamped with the transaction key, so a payment recorded in
/// the same millisecond survives.
///
/// ## Errors
/// `TransactionNotFound` when no sale carries that timestamp.
pub fn void_transaction(state: &mut AppState, timestamp: DateTime<Utc>) -> CoreResult<VoidReceipt> {
    let group: Vec<(String, i64)> = state
        .transaction(timestamp)
        .map(|s| (s.product_id.clone(), s.quantity))
        .collect();

    let Some(first) = state.transaction(timestamp).next() else {
        return Err(CoreError::TransactionNotFound(timestamp.timestamp_millis()));
    };
    let sale_ids: Vec<String> = state.transaction(timestamp).map(|s| s.id.clone()).collect();
    let customer_name = first.customer_name.clone();
    let customer_phone = first.customer_phone.clone();
    let group_due: Money = state.transaction(timestamp).map(|s| s.due_amount).sum();

    let mut restored_lines = 0;
    let mut skipped_lines = 0;
    for (product_id, quantity) in &group {
        match state.product_mut(product_id) {
            Some(product) => {
                product.stock += quantity;
                restored_lines += 1;
            }
            None => skipped_lines += 1,
        }
    }

    let mut receipt = VoidReceipt {
        timestamp,
        removed_lines: group.len(),
        restored_lines,
        skipped_lines,
        credit_id: None,
        reversed_due: Money::zero(),
        absorbed_by_floor: Money::zero(),
    };

    if let Some(found) = resolve_customer(&state.credits, &customer_name, &customer_phone) {
        let credit = &mut state.credits[found.index];
        let before = credit.total_due;
        let after = (before - group_due).max(Money::zero());

        credit.total_due = after;
        credit
            .history
            .retain(|entry| !belongs_to_transaction(entry, &sale_ids, timestamp));

        receipt.credit_id = Some(credit.id.clone());
        receipt.reversed_due = before - after;
        receipt.absorbed_by_floor = group_due - receipt.reversed_due;

        if !receipt.absorbed_by_floor.is_zero() {
            warn!(
                credit_id = %credit.id,
                group_due = %group_due,
                absorbed = %receipt.absorbed_by_floor,
                "Void reversal clamped at zero balance"
            );
        }
    }

    state.sales.retain(|s| s.timestamp != timestamp);

    if skipped_lines > 0 {
        warn!(
            timestamp = timestamp.timestamp_millis(),
            skipped = skipped_lines,
            "Void skipped lines for deleted products"
        );
    }
    info!(
        timestamp = timestamp.timestamp_millis(),
        lines = receipt.removed_lines,
        reversed_due = %receipt.reversed_due,
        "Transaction voided"
    );

    Ok(receipt)
}

fn belongs_to_transaction(
    entry: &CreditEntry,
    sale_ids: &[String],
    timestamp: DateTime<Utc>,
) -> bool {
    match &entry.related_sale_id {
        Some(id) => sale_ids.contains(id),
        None => entry.kind == EntryKind::Purchase && entry.timestamp == timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::checkout::{checkout, CheckoutItem, CheckoutRequest};
    use crate::ledger::payment::record_payment;
    use crate::ledger::test_support::{at, product, state_with};

    fn m(v: i64) -> Money {
        Money::from_minor(v)
    }

    #[test]
    fn test_void_restores_stock_and_balance() {
        let mut state = state_with(vec![
            product("a", "Napa", 10, 100, 60),
            product("b", "Sergel", 10, 200, 120),
        ]);
        let receipt = checkout(
            &mut state,
            CheckoutRequest::new(vec![CheckoutItem::new("a", 2), CheckoutItem::new("b", 1)])
                .paid(m(300))
                .customer("Rahim", "0171"),
            at(1_000),
        )
        .unwrap();
        assert_eq!(state.credits[0].total_due, m(100));

        let voided = void_transaction(&mut state, receipt.timestamp).unwrap();

        assert_eq!(voided.removed_lines, 2);
        assert_eq!(voided.restored_lines, 2);
        assert_eq!(voided.reversed_due, m(100));
        assert_eq!(voided.absorbed_by_floor, Money::zero());
        assert_eq!(state.product("a").unwrap().stock, 10);
        assert_eq!(state.product("b").unwrap().stock, 10);
        assert!(state.sales.is_empty());
        assert_eq!(state.credits[0].total_due, Money::zero());
        assert!(state.credits[0].history.is_empty());
        assert!(state.credits[0].is_balanced());
    }

    #[test]
    fn test_void_skips_deleted_products() {
        let mut state = state_with(vec![
            product("a", "Napa", 10, 100, 60),
            product("b", "Sergel", 10, 200, 120),
        ]);
        let receipt = checkout(
            &mut state,
            CheckoutRequest::new(vec![CheckoutItem::new("a", 2), CheckoutItem::new("b", 3)])
                .paid(m(800)),
            at(1_000),
        )
        .unwrap();
        state.products.retain(|p| p.id != "b");

        let voided = void_transaction(&mut state, receipt.timestamp).unwrap();

        assert_eq!(voided.restored_lines, 1);
        assert_eq!(voided.skipped_lines, 1);
        assert_eq!(state.product("a").unwrap().stock, 10);
        assert!(state.product("b").is_none());
        assert!(state.sales.is_empty());
    }

    #[test]
    fn test_void_floors_balance_and_reports_absorbed() {
        let mut state = state_with(vec![product("a", "Napa", 10, 100, 60)]);
        let receipt = checkout(
            &mut state,
            CheckoutRequest::new(vec![CheckoutItem::new("a", 1)]).customer("Rahim", ""),
            at(1_000),
        )
        .unwrap();
        let credit_id = receipt.credit_id.unwrap();
        record_payment(&mut state, &credit_id, m(60), at(2_000)).unwrap();

        let voided = void_transaction(&mut state, receipt.timestamp).unwrap();

        assert_eq!(voided.reversed_due, m(40));
        assert_eq!(voided.absorbed_by_floor, m(60));
        let credit = state.credit(&credit_id).unwrap();
        assert_eq!(credit.total_due, Money::zero());
        // only the payment entry remains, so the history no longer agrees
        assert_eq!(credit.history.len(), 1);
        assert!(!credit.is_balanced());
    }

    #[test]
    fn test_void_keeps_payment_in_same_millisecond() {
        let mut state = state_with(vec![product("a", "Napa", 10, 100, 60)]);
        let receipt = checkout(
            &mut state,
            CheckoutRequest::new(vec![CheckoutItem::new("a", 1)]).customer("Rahim", ""),
            at(1_000),
        )
        .unwrap();
        let credit_id = receipt.credit_id.unwrap();
        record_payment(&mut state, &credit_id, m(30), receipt.timestamp).unwrap();

        let voided = void_transaction(&mut state, receipt.timestamp).unwrap();

        assert_eq!(voided.reversed_due, m(70));
        let credit = state.credit(&credit_id).unwrap();
        assert_eq!(credit.history.len(), 1);
        assert_eq!(credit.history[0].kind, EntryKind::Payment);
        assert_eq!(credit.history[0].amount, m(30));
        assert_eq!(credit.history[0].timestamp, receipt.timestamp);
    }

    #[test]
    fn test_void_removes_unlinked_purchase_entry_by_key() {
        let mut state = state_with(vec![product("a", "Napa", 10, 100, 60)]);
        let receipt = checkout(
            &mut state,
            CheckoutRequest::new(vec![CheckoutItem::new("a", 1)]).customer("Rahim", ""),
            at(1_000),
        )
        .unwrap();
        // Entries restored from older backups carry no sale link.
        state.credits[0].history[0].related_sale_id = None;

        void_transaction(&mut state, receipt.timestamp).unwrap();

        assert!(state.credits[0].history.is_empty());
        assert!(state.credits[0].is_balanced());
    }

    #[test]
    fn test_void_unknown_timestamp() {
        let mut state = state_with(vec![]);
        assert_eq!(
            void_transaction(&mut state, at(42)),
            Err(CoreError::TransactionNotFound(42))
        );
    }

    #[test]
    fn test_void_leaves_other_transactions() {
        let mut state = state_with(vec![product("a", "Napa", 10, 100, 60)]);
        let request = CheckoutRequest::new(vec![CheckoutItem::new("a", 1)]).paid(m(100));
        let first = checkout(&mut state, request.clone(), at(1)).unwrap();
        let second = checkout(&mut state, request, at(2)).unwrap();

        void_transaction(&mut state, first.timestamp).unwrap();

        assert_eq!(state.sales.len(), 1);
        assert_eq!(state.sales[0].timestamp, second.timestamp);
        assert_eq!(state.product("a").unwrap().stock, 9);
    }
}
