//! # Checkout
//!
//! Turns a cart into sale lines, moves stock, and rolls the unpaid
//! remainder into the customer's credit account.
//!
//! ## Flow
//! ```text
//! CheckoutRequest
//!      │
//!      ▼
//! ┌─────────────────────────┐  any failure → Err, state untouched
//! │ 1. validate + stock     │──────────────────────────────────────►
//! └───────────┬─────────────┘
//!             ▼
//! ┌─────────────────────────┐
//! │ 2. gross, discount, net │  applied discount = min(discount, gross)
//! │    transaction due      │  due = net − paid (negative = overpaid)
//! └───────────┬─────────────┘
//!             ▼
//! ┌─────────────────────────┐
//! │ 3. allocate discount    │  weights = line gross
//! │    allocate paid        │  weights = line net (zero if net == 0)
//! └───────────┬─────────────┘
//!             ▼
//! ┌─────────────────────────┐
//! │ 4. stock −= qty         │
//! │    unique timestamp     │
//! │    post due to credit   │
//! │    prepend sales        │
//! └─────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::allocation::allocate;
use crate::customer::resolve_customer;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{AppState, Credit, Sale};
use crate::validation::{validate_non_negative, validate_phone, validate_quantity};
use crate::{new_id, DEFAULT_CUSTOMER_NAME};

use super::free_transaction_timestamp;

// =============================================================================
// Request / Receipt
// =============================================================================

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutItem {
    pub product_id: String,
    pub quantity: i64,
}

impl CheckoutItem {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Everything the counter submits for one checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,

    /// Cash tendered
    #[serde(default)]
    pub paid: Money,

    /// Transaction-level discount
    #[serde(default)]
    pub discount: Money,

    /// Blank means the walk-in "Cash Customer"
    #[serde(default)]
    pub customer_name: String,

    #[serde(default)]
    pub customer_phone: String,
}

impl CheckoutRequest {
    /// A walk-in checkout with nothing paid and no discount.
    pub fn new(items: Vec<CheckoutItem>) -> Self {
        Self {
            items,
            paid: Money::zero(),
            discount: Money::zero(),
            customer_name: String::new(),
            customer_phone: String::new(),
        }
    }

    pub fn paid(mut self, paid: Money) -> Self {
        self.paid = paid;
        self
    }

    pub fn discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    pub fn customer(mut self, name: impl Into<String>, phone: impl Into<String>) -> Self {
        self.customer_name = name.into();
        self.customer_phone = phone.into();
        self
    }
}

/// What a successful checkout produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutReceipt {
    /// Transaction key shared by every line
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub timestamp: DateTime<Utc>,

    /// Lines in cart order
    pub sales: Vec<Sale>,

    pub gross: Money,

    /// Discount actually applied (never more than gross)
    pub discount: Money,

    pub net: Money,

    pub paid: Money,

    /// net − paid; negative when the customer overpaid
    pub transaction_due: Money,

    /// Account the due was posted to, if any
    pub credit_id: Option<String>,

    /// The customer match was contested
    pub customer_ambiguous: bool,
}

// =============================================================================
// Checkout
// =============================================================================

/// Product fields captured once all checks pass.
struct PricedLine {
    product_id: String,
    product_name: String,
    unit: String,
    quantity: i64,
    sell_price: Money,
    buy_price: Money,
    /// sell_price × quantity
    gross: Money,
    /// buy_price × quantity
    cost: Money,
}

/// Runs a checkout against `state`.
///
/// ## Errors
/// - `EmptyCheckout` for an empty cart
/// - `Validation` for a non-positive quantity, negative paid/discount, or
///   line amounts too large to total
/// - `ProductNotFound` / `InsufficientStock` per line; the same product on
///   two lines is checked against its combined quantity
///
/// On any error `state` is unchanged.
pub fn checkout(
    state: &mut AppState,
    request: CheckoutRequest,
    at: DateTime<Utc>,
) -> CoreResult<CheckoutReceipt> {
    let lines = price_lines(state, &request)?;

    let customer_name = match request.customer_name.trim() {
        "" => DEFAULT_CUSTOMER_NAME.to_string(),
        name => name.to_string(),
    };
    let customer_phone = request.customer_phone.trim().to_string();

    // Totals
    let line_gross: Vec<Money> = lines.iter().map(|line| line.gross).collect();
    let gross: Money = line_gross.iter().sum();
    // Capped so net never goes negative; the applied discount is reported
    // on the receipt and is what the lines share.
    let discount = request.discount.min(gross);
    let net = gross - discount;
    let paid = request.paid;
    let transaction_due = net - paid;

    // Allocation
    let discount_shares = allocate(discount, &line_gross);
    let line_net: Vec<Money> = line_gross
        .iter()
        .zip(&discount_shares)
        .map(|(g, d)| *g - *d)
        .collect();
    let paid_shares = if net.is_positive() {
        allocate(paid, &line_net)
    } else {
        vec![Money::zero(); lines.len()]
    };

    let timestamp = free_transaction_timestamp(state, at);

    // Customer account lookup happens before mutation so previous_balance
    // reflects the pre-checkout balance.
    let customer = resolve_customer(&state.credits, &customer_name, &customer_phone);
    let previous_balance = customer
        .map(|m| state.credits[m.index].total_due)
        .unwrap_or_default();

    let sales: Vec<Sale> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let total = line_net[i];
            let paid_amount = paid_shares[i];
            Sale {
                id: new_id(),
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit: line.unit.clone(),
                sell_price: line.sell_price,
                buy_price: line.buy_price,
                total,
                discount: discount_shares[i],
                paid_amount,
                due_amount: total - paid_amount,
                previous_balance,
                customer_name: customer_name.clone(),
                customer_phone: customer_phone.clone(),
                profit: total - line.cost,
                timestamp,
            }
        })
        .collect();

    // ---- mutation starts here; nothing below can fail ----

    for line in &lines {
        if let Some(product) = state.product_mut(&line.product_id) {
            product.stock -= line.quantity;
        }
    }

    let first_sale_id = sales[0].id.clone();
    let reference: String = first_sale_id.chars().take(5).collect();

    let credit_id = match customer {
        Some(found) => {
            let credit = &mut state.credits[found.index];
            credit.post(
                transaction_due,
                timestamp,
                format!("Purchase Ref: {reference}"),
                Some(first_sale_id.clone()),
            );
            Some(credit.id.clone())
        }
        None if transaction_due.is_positive() => {
            let mut credit = Credit {
                id: new_id(),
                customer_name: customer_name.clone(),
                customer_phone: customer_phone.clone(),
                total_due: Money::zero(),
                history: Vec::new(),
            };
            credit.post(
                transaction_due,
                timestamp,
                "New Account Purchase",
                Some(first_sale_id.clone()),
            );
            let id = credit.id.clone();
            state.credits.insert(0, credit);
            debug!(credit_id = %id, customer = %customer_name, "Opened credit account at checkout");
            Some(id)
        }
        None => None,
    };

    state.sales.splice(0..0, sales.iter().cloned());

    info!(
        timestamp = timestamp.timestamp_millis(),
        lines = sales.len(),
        gross = %gross,
        discount = %discount,
        net = %net,
        paid = %paid,
        due = %transaction_due,
        customer = %customer_name,
        "Checkout recorded"
    );

    Ok(CheckoutReceipt {
        timestamp,
        sales,
        gross,
        discount,
        net,
        paid,
        transaction_due,
        credit_id,
        customer_ambiguous: customer.map(|m| m.ambiguous).unwrap_or(false),
    })
}

/// Validates the request and snapshots product fields per line.
fn price_lines(state: &AppState, request: &CheckoutRequest) -> CoreResult<Vec<PricedLine>> {
    if request.items.is_empty() {
        return Err(CoreError::EmptyCheckout);
    }
    validate_non_negative("paid", request.paid)?;
    validate_non_negative("discount", request.discount)?;
    validate_phone(&request.customer_phone)?;

    let mut requested: HashMap<&str, i64> = HashMap::new();
    let mut lines = Vec::with_capacity(request.items.len());
    let mut gross = Money::zero();

    for item in &request.items {
        validate_quantity(item.quantity)?;

        let product = state
            .product(&item.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

        let wanted = requested.entry(item.product_id.as_str()).or_insert(0);
        *wanted = wanted
            .checked_add(item.quantity)
            .ok_or_else(|| ValidationError::too_large("quantity"))?;

        if *wanted > product.stock {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: *wanted,
            });
        }

        let line_gross = product
            .sell_price
            .checked_multiply_quantity(item.quantity)
            .ok_or_else(|| ValidationError::too_large("total"))?;
        let cost = product
            .buy_price
            .checked_multiply_quantity(item.quantity)
            .ok_or_else(|| ValidationError::too_large("total"))?;
        gross = gross
            .checked_add(line_gross)
            .ok_or_else(|| ValidationError::too_large("total"))?;

        lines.push(PricedLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            unit: product.unit.clone(),
            quantity: item.quantity,
            sell_price: product.sell_price,
            buy_price: product.buy_price,
            gross: line_gross,
            cost,
        });
    }

    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================
