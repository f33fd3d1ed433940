//! # Credit Accounts
//!
//! Explicit account creation and edits. Accounts are also opened
//! implicitly by checkout when an unknown customer leaves a due.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::new_id;
use crate::types::{AppState, Credit};
use crate::validation::{validate_name, validate_non_negative, validate_phone};

/// Fails when another account already uses this non-empty phone.
fn ensure_phone_free(state: &AppState, phone: &str, except_id: Option<&str>) -> CoreResult<()> {
    if phone.is_empty() {
        return Ok(());
    }

    let taken = state
        .credits
        .iter()
        .any(|c| c.customer_phone.trim() == phone && Some(c.id.as_str()) != except_id);

    if taken {
        return Err(CoreError::DuplicateCustomer {
            phone: phone.to_string(),
        });
    }
    Ok(())
}

/// Opens a credit account. A positive opening balance is posted as the
/// first `purchase` entry so the history explains the balance.
pub fn add_credit_account(
    state: &mut AppState,
    name: &str,
    phone: &str,
    opening_balance: Money,
    at: DateTime<Utc>,
) -> CoreResult<Credit> {
    validate_name(name)?;
    validate_phone(phone)?;
    validate_non_negative("openingBalance", opening_balance)?;

    let phone = phone.trim();
    ensure_phone_free(state, phone, None)?;

    let mut credit = Credit {
        id: new_id(),
        customer_name: name.trim().to_string(),
        customer_phone: phone.to_string(),
        total_due: Money::zero(),
        history: Vec::new(),
    };
    credit.post(opening_balance, at, "Opening Balance", None);

    info!(
        credit_id = %credit.id,
        customer = %credit.customer_name,
        opening = %opening_balance,
        "Credit account opened"
    );

    state.credits.insert(0, credit.clone());
    Ok(credit)
}

/// Renames an account or changes its phone. Balance and history are kept.
pub fn update_credit_account(
    state: &mut AppState,
    id: &str,
    name: &str,
    phone: &str,
) -> CoreResult<()> {
    validate_name(name)?;
    validate_phone(phone)?;

    let phone = phone.trim();
    ensure_phone_free(state, phone, Some(id))?;

    let credit = state
        .credit_mut(id)
        .ok_or_else(|| CoreError::CreditNotFound(id.to_string()))?;
    credit.customer_name = name.trim().to_string();
    credit.customer_phone = phone.to_string();

    info!(credit_id = %id, "Credit account updated");
    Ok(())
}
