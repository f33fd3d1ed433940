//! # Due Payment
//!
//! A customer pays down their balance at the counter.
//!
//! ## Clamping
//! ```text
//! before = 300, tendered = 500
//!   applied   = 300   → payment entry of 300
//!   remaining = 0
//!   unapplied = 200   → reported, not credited
//! ```
//! The history only ever receives the amount that moved the balance, so the
//! account stays balanced. An account already at or below zero takes nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::new_id;
use crate::types::AppState;
use crate::validation::validate_positive;

/// Printed on the payment slip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentReceipt {
    /// History entry id (fresh id when nothing was applied)
    pub id: String,

    pub credit_id: String,

    pub customer_name: String,

    /// Amount tendered
    pub amount_paid: Money,

    pub applied: Money,

    pub unapplied: Money,

    pub remaining_due: Money,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub timestamp: DateTime<Utc>,
}

/// Records a due payment against `credit_id`.
///
/// ## Errors
/// - `Validation` when `amount` is not positive
/// - `CreditNotFound` for an unknown account
pub fn record_payment(
    state: &mut AppState,
    credit_id: &str,
    amount: Money,
    at: DateTime<Utc>,
) -> CoreResult<PaymentReceipt> {
    validate_positive("amount", amount)?;

    let credit = state
        .credit_mut(credit_id)
        .ok_or_else(|| CoreError::CreditNotFound(credit_id.to_string()))?;

    let before = credit.total_due;
    let applied = amount.min(before.max(Money::zero()));
    let unapplied = amount - applied;

    let entry_id = credit
        .post(-applied, at, "Cash Payment Received", None)
        .map(|entry| entry.id.clone())
        .unwrap_or_else(new_id);

    if unapplied.is_positive() {
        warn!(
            credit_id = %credit.id,
            balance = %before,
            unapplied = %unapplied,
            "Payment exceeds balance; excess not credited"
        );
    }
    info!(
        credit_id = %credit.id,
        applied = %applied,
        remaining = %credit.total_due,
        "Due payment recorded"
    );

    Ok(PaymentReceipt {
        id: entry_id,
        credit_id: credit.id.clone(),
        customer_name: credit.customer_name.clone(),
        amount_paid: amount,
        applied,
        unapplied,
        remaining_due: credit.total_due,
        timestamp: at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::accounts::add_credit_account;
    use crate::ledger::test_support::{at, state_with};
    use crate::types::EntryKind;

    fn m(v: i64) -> Money {
        Money::from_minor(v)
    }

    #[test]
    fn test_partial_payment() {
        let mut state = state_with(vec![]);
        let credit = add_credit_account(&mut state, "Rahim", "0171", m(500), at(1)).unwrap();

        let receipt = record_payment(&mut state, &credit.id, m(200), at(2)).unwrap();

        assert_eq!(receipt.applied, m(200));
        assert_eq!(receipt.unapplied, Money::zero());
        assert_eq!(receipt.remaining_due, m(300));
        assert_eq!(receipt.customer_name, "Rahim");

        let credit = state.credit(&credit.id).unwrap();
        assert_eq!(credit.history[0].kind, EntryKind::Payment);
        assert_eq!(credit.history[0].note.as_deref(), Some("Cash Payment Received"));
        assert_eq!(credit.history[0].id, receipt.id);
        assert!(credit.is_balanced());
    }

    #[test]
    fn test_overpayment_is_clamped() {
        let mut state = state_with(vec![]);
        let credit = add_credit_account(&mut state, "Rahim", "", m(300), at(1)).unwrap();

        let receipt = record_payment(&mut state, &credit.id, m(500), at(2)).unwrap();

        assert_eq!(receipt.amount_paid, m(500));
        assert_eq!(receipt.applied, m(300));
        assert_eq!(receipt.unapplied, m(200));
        assert_eq!(receipt.remaining_due, Money::zero());
        assert!(state.credit(&credit.id).unwrap().is_balanced());
    }

    #[test]
    fn test_payment_on_settled_account_applies_nothing() {
        let mut state = state_with(vec![]);
        let credit = add_credit_account(&mut state, "Rahim", "", Money::zero(), at(1)).unwrap();

        let receipt = record_payment(&mut state, &credit.id, m(100), at(2)).unwrap();

        assert_eq!(receipt.applied, Money::zero());
        assert_eq!(receipt.unapplied, m(100));
        assert!(state.credit(&credit.id).unwrap().history.is_empty());
    }

    #[test]
    fn test_payment_rejections() {
        let mut state = state_with(vec![]);
        assert_eq!(
            record_payment(&mut state, "nope", m(1), at(1)),
            Err(CoreError::CreditNotFound("nope".to_string()))
        );

        let credit = add_credit_account(&mut state, "Rahim", "", m(100), at(1)).unwrap();
        assert!(matches!(
            record_payment(&mut state, &credit.id, Money::zero(), at(2)),
            Err(CoreError::Validation(_))
        ));
    }
}
