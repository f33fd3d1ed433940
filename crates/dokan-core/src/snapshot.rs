//! # Snapshot Codec
//!
//! Backup files and restore. A backup is the same camelCase JSON as the
//! local record.
//!
//! ## Restore Check
//! ```text
//! raw text ──► JSON? ──► object? ──► has "products" and "sales"? ──► AppState
//!                │          │                  │
//!                ▼          ▼                  ▼
//!            Malformed  NotAnObject      MissingKey(..)
//! ```
//! Anything else missing is filled from defaults. The caller swaps the result
//! in only on `Ok`, so a bad file never touches the running state.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::error::SnapshotError;
use crate::types::AppState;

/// Keys every backup must carry.
pub const REQUIRED_KEYS: [&str; 2] = ["products", "sales"];

/// Serializes the full state for a backup file.
pub fn export_snapshot(state: &AppState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Parses a backup file.
pub fn import_snapshot(raw: &str) -> Result<AppState, SnapshotError> {
    let value: Value = serde_json::from_str(raw)?;

    let object = value.as_object().ok_or(SnapshotError::NotAnObject)?;
    for key in REQUIRED_KEYS {
        if !object.contains_key(key) {
            return Err(SnapshotError::MissingKey(key));
        }
    }

    let mut state: AppState = serde_json::from_value(value)?;
    state.is_syncing = false;

    debug!(
        products = state.products.len(),
        sales = state.sales.len(),
        purchases = state.purchases.len(),
        credits = state.credits.len(),
        "Snapshot imported"
    );
    Ok(state)
}

/// `shop_backup_YYYY-MM-DD.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("shop_backup_{}.json", date.format("%Y-%m-%d"))
}
