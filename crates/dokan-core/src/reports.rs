//! # Reports
//!
//! Read-only views over an [`AppState`]: the dashboard, lifetime totals,
//! grouped transaction history and credit search.
//!
//! ## Dates
//! "Today" and expiry comparisons use the UTC calendar date of `now`.
//! Expiry strings that do not parse as `YYYY-MM-DD` are ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{AppState, Credit, Product, Sale};
use crate::UNKNOWN_PRODUCT;

/// Number of recent sales shown on the dashboard.
pub const RECENT_SALES: usize = 7;

/// Expiry warning horizon.
pub const EXPIRY_WINDOW_MONTHS: u32 = 3;

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummary {
    pub today_sales: Money,
    pub today_purchase_cost: Money,
    /// Σ of every account's signed balance
    pub total_due: Money,
    pub low_stock: Vec<Product>,
    /// Expiring within the window and not yet expired
    pub expiring_soon: Vec<Product>,
    /// Newest first
    pub recent_sales: Vec<Sale>,
}

/// Builds the dashboard as of `now`.
pub fn dashboard(state: &AppState, now: DateTime<Utc>) -> DashboardSummary {
    let today = now.date_naive();
    let horizon = today
        .checked_add_months(Months::new(EXPIRY_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MAX);

    let today_sales = state
        .sales
        .iter()
        .filter(|s| s.timestamp.date_naive() == today)
        .map(|s| s.total)
        .sum();

    let today_purchase_cost = state
        .purchases
        .iter()
        .filter(|p| p.timestamp.date_naive() == today)
        .map(|p| p.cost)
        .sum();

    let expiring_soon = state
        .products
        .iter()
        .filter(|p| {
            parse_expiry(&p.expiry_date)
                .map(|expiry| expiry > today && expiry <= horizon)
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    DashboardSummary {
        today_sales,
        today_purchase_cost,
        total_due: state.credits.iter().map(|c| c.total_due).sum(),
        low_stock: low_stock(state).into_iter().cloned().collect(),
        expiring_soon,
        recent_sales: state.sales.iter().take(RECENT_SALES).cloned().collect(),
    }
}

/// Products at or below their alert level.
pub fn low_stock(state: &AppState) -> Vec<&Product> {
    state.products.iter().filter(|p| p.is_low_stock()).collect()
}

fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

// =============================================================================
// Totals
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Totals {
    pub total_sales: Money,
    pub total_profit: Money,
    pub total_purchase_cost: Money,
    /// Stock on hand at current cost basis
    pub stock_value: Money,
}

pub fn totals(state: &AppState) -> Totals {
    Totals {
        total_sales: state.sales.iter().map(|s| s.total).sum(),
        total_profit: state.sales.iter().map(|s| s.profit).sum(),
        total_purchase_cost: state.purchases.iter().map(|p| p.cost).sum(),
        stock_value: state.products.iter().map(Product::stock_value).sum(),
    }
}

// =============================================================================
// Transaction History
// =============================================================================

/// One checkout as the history screen shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionSummary {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub timestamp: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: String,
    pub lines: Vec<Sale>,
    pub total: Money,
    pub discount: Money,
    pub paid: Money,
    pub due: Money,
    /// Lines whose product has since been deleted
    pub dangling_lines: usize,
}

/// Sales grouped by transaction timestamp, newest first.
pub fn transaction_history(state: &AppState) -> Vec<TransactionSummary> {
    let mut groups: BTreeMap<DateTime<Utc>, Vec<&Sale>> = BTreeMap::new();
    for sale in &state.sales {
        groups.entry(sale.timestamp).or_default().push(sale);
    }

    groups
        .into_iter()
        .rev()
        .map(|(timestamp, lines)| {
            let first = lines[0];
            TransactionSummary {
                timestamp,
                customer_name: first.customer_name.clone(),
                customer_phone: first.customer_phone.clone(),
                total: lines.iter().map(|s| s.total).sum(),
                discount: lines.iter().map(|s| s.discount).sum(),
                paid: lines.iter().map(|s| s.paid_amount).sum(),
                due: lines.iter().map(|s| s.due_amount).sum(),
                dangling_lines: lines
                    .iter()
                    .filter(|s| state.product(&s.product_id).is_none())
                    .count(),
                lines: lines.into_iter().cloned().collect(),
            }
        })
        .collect()
}

/// Current catalog name for a product id, or a placeholder once deleted.
pub fn product_label<'a>(state: &'a AppState, product_id: &str) -> &'a str {
    state
        .product(product_id)
        .map(|p| p.name.as_str())
        .unwrap_or(UNKNOWN_PRODUCT)
}

// =============================================================================
// Credit Search
// =============================================================================

/// Accounts whose name (case-insensitive) or phone contains `query`.
/// A blank query returns every account.
pub fn search_credits<'a>(state: &'a AppState, query: &str) -> Vec<&'a Credit> {
    let needle = query.trim().to_lowercase();
    state
        .credits
        .iter()
        .filter(|c| {
            needle.is_empty()
                || c.customer_name.to_lowercase().contains(&needle)
                || c.customer_phone.contains(&needle)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
