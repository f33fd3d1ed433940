//! # Catalog Edits
//!
//! Add, edit and delete products. Deleting never cascades: sales and
//! purchases keep the product id they were recorded with.

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::new_id;
use crate::types::{AppState, Product};
use crate::validation::{validate_name, validate_prices};

/// Editable product fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub batch_number: String,
    pub unit: String,
    pub buy_price: Money,
    pub sell_price: Money,
    pub stock: i64,
    pub expiry_date: String,
    pub low_stock_threshold: i64,
}

impl ProductDraft {
    fn validate(&self) -> CoreResult<()> {
        validate_name(&self.name)?;
        validate_prices(self.buy_price, self.sell_price)?;
        if self.low_stock_threshold < 0 {
            return Err(ValidationError::non_negative("lowStockThreshold").into());
        }
        Ok(())
    }

    fn apply_to(self, product: &mut Product) {
        product.name = self.name.trim().to_string();
        product.category = self.category.trim().to_string();
        product.batch_number = self.batch_number.trim().to_string();
        product.unit = self.unit.trim().to_string();
        product.buy_price = self.buy_price;
        product.sell_price = self.sell_price;
        product.stock = self.stock;
        product.expiry_date = self.expiry_date.trim().to_string();
        product.low_stock_threshold = self.low_stock_threshold;
    }
}

/// Adds a product with a fresh id.
///
/// Opening stock must not be negative.
pub fn add_product(state: &mut AppState, draft: ProductDraft) -> CoreResult<Product> {
    draft.validate()?;
    if draft.stock < 0 {
        return Err(ValidationError::non_negative("stock").into());
    }

    let mut product = Product {
        id: new_id(),
        ..Default::default()
    };
    draft.apply_to(&mut product);

    info!(product_id = %product.id, name = %product.name, stock = product.stock, "Product added");
    state.products.push(product.clone());
    Ok(product)
}

/// Replaces every editable field of an existing product.
///
/// Stock is taken as given (manual stock correction).
pub fn update_product(state: &mut AppState, id: &str, draft: ProductDraft) -> CoreResult<()> {
    draft.validate()?;

    let product = state
        .product_mut(id)
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
    draft.apply_to(product);

    info!(product_id = %id, "Product updated");
    Ok(())
}

/// Removes a product; history rows keep their dangling reference.
pub fn delete_product(state: &mut AppState, id: &str) -> CoreResult<Product> {
    let index = state
        .products
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

    let removed = state.products.remove(index);
    info!(product_id = %id, name = %removed.name, "Product deleted");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::state_with;

    fn draft(name: &str, stock: i64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            unit: "pcs".to_string(),
            buy_price: Money::from_minor(60),
            sell_price: Money::from_minor(100),
            stock,
            ..Default::default()
        }
    }

    #[test]
    fn test_add_update_delete() {
        let mut state = state_with(vec![]);

        let product = add_product(&mut state, draft(" Napa ", 10)).unwrap();
        assert_eq!(product.name, "Napa");
        assert_eq!(state.products.len(), 1);

        let mut edit = draft("Napa Extra", -2);
        edit.low_stock_threshold = 4;
        update_product(&mut state, &product.id, edit).unwrap();
        let stored = state.product(&product.id).unwrap();
        assert_eq!(stored.name, "Napa Extra");
        assert_eq!(stored.stock, -2);
        assert_eq!(stored.low_stock_threshold, 4);

        let removed = delete_product(&mut state, &product.id).unwrap();
        assert_eq!(removed.id, product.id);
        assert!(state.products.is_empty());
    }

    #[test]
    fn test_catalog_rejections() {
        let mut state = state_with(vec![]);

        assert!(matches!(
            add_product(&mut state, draft("", 1)),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            add_product(&mut state, draft("Napa", -1)),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(
            update_product(&mut state, "x", draft("Napa", 1)),
            Err(CoreError::ProductNotFound("x".to_string()))
        );
        assert_eq!(
            delete_product(&mut state, "x"),
            Err(CoreError::ProductNotFound("x".to_string()))
        );
        assert!(state.products.is_empty());
    }
}
