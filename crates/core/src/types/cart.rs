//! Cart state and its stock rules.
//!
//! The same [`Cart`] value backs both the guest cart kept in local storage
//! and the local mirror of the server cart. Every mutation clamps line
//! quantities to the stock reported by the product snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::{CategoryId, ProductId};
use super::product::Product;

/// Errors raised by cart mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("{0} is out of stock")]
    OutOfStock(String),
    #[error("{0} is no longer available")]
    Unavailable(String),
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// Denormalized product data stored with each cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category_id: CategoryId,
    #[serde(default)]
    pub is_vegetarian: bool,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            image_url: product.image_url.clone(),
            category_id: product.category.id().clone(),
            is_vegetarian: product.is_vegetarian,
        }
    }
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub product: ProductSnapshot,
}

impl CartItem {
    /// `price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// Raised when a requested quantity was reduced to the available stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockWarning {
    pub requested: u32,
    pub available: u32,
}

impl StockWarning {
    /// Toast text for the clamp.
    #[must_use]
    pub fn message(&self, product_name: &str) -> String {
        format!(
            "Chỉ còn {} {product_name} trong kho (bạn yêu cầu {})",
            self.available, self.requested
        )
    }
}

/// Outcome of a quantity change on a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartUpdate {
    /// Quantity of the line after the change (0 when removed).
    pub quantity: u32,
    /// Present when the request exceeded stock and was clamped.
    pub warning: Option<StockWarning>,
}

/// A list of (product, quantity) lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// Add `quantity` units of a product, merging with an existing line.
    ///
    /// The snapshot on an existing line is refreshed so later clamps use the
    /// latest stock figure.
    ///
    /// # Errors
    ///
    /// Returns an error if `quantity` is zero or the product has no stock.
    pub fn add(
        &mut self,
        product_id: &ProductId,
        snapshot: ProductSnapshot,
        quantity: u32,
    ) -> Result<CartUpdate, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if snapshot.stock == 0 {
            return Err(CartError::OutOfStock(snapshot.name));
        }

        let existing = self.get(product_id).map_or(0, |item| item.quantity);
        let requested = existing.saturating_add(quantity);
        let (final_qty, warning) = clamp(requested, snapshot.stock);

        if let Some(item) = self.items.iter_mut().find(|i| &i.product_id == product_id) {
            item.quantity = final_qty;
            item.product = snapshot;
        } else {
            self.items.push(CartItem {
                product_id: product_id.clone(),
                quantity: final_qty,
                product: snapshot,
            });
        }

        Ok(CartUpdate {
            quantity: final_qty,
            warning,
        })
    }

    /// Set the quantity of an existing line. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line.
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartUpdate, CartError> {
        if quantity == 0 {
            self.remove(product_id)?;
            return Ok(CartUpdate {
                quantity: 0,
                warning: None,
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| &i.product_id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;

        if item.product.stock == 0 {
            return Err(CartError::OutOfStock(item.product.name.clone()));
        }

        let (final_qty, warning) = clamp(quantity, item.product.stock);
        item.quantity = final_qty;

        Ok(CartUpdate {
            quantity: final_qty,
            warning,
        })
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line.
    pub fn remove(&mut self, product_id: &ProductId) -> Result<CartItem, CartError> {
        let pos = self
            .items
            .iter()
            .position(|i| &i.product_id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;
        Ok(self.items.remove(pos))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total number of units.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

const fn clamp(requested: u32, stock: u32) -> (u32, Option<StockWarning>) {
    if requested > stock {
        (
            stock,
            Some(StockWarning {
                requested,
                available: stock,
            }),
        )
    } else {
        (requested, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str, price: i64, stock: u32) -> ProductSnapshot {
        ProductSnapshot {
            name: name.to_string(),
            price: Decimal::from(price),
            stock,
            image_url: None,
            category_id: CategoryId::new("burger"),
            is_vegetarian: false,
        }
    }

    #[test]
    fn test_add_within_stock() {
        let mut cart = Cart::default();
        let id = ProductId::new("p1");
        let update = cart.add(&id, snapshot("Burger", 50_000, 10), 3).expect("add");
        assert_eq!(update.quantity, 3);
        assert!(update.warning.is_none());
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_exceeding_stock_clamps_and_warns() {
        let mut cart = Cart::default();
        let id = ProductId::new("p1");
        cart.add(&id, snapshot("Burger", 50_000, 5), 3).expect("add");
        let update = cart.add(&id, snapshot("Burger", 50_000, 5), 4).expect("add");

        assert_eq!(update.quantity, 5);
        assert_eq!(
            update.warning,
            Some(StockWarning {
                requested: 7,
                available: 5
            })
        );
        assert_eq!(cart.get(&id).map(|i| i.quantity), Some(5));
    }

    #[test]
    fn test_add_out_of_stock_rejected() {
        let mut cart = Cart::default();
        let result = cart.add(&ProductId::new("p1"), snapshot("Gà rán", 35_000, 0), 1);
        assert_eq!(result, Err(CartError::OutOfStock("Gà rán".to_string())));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_zero_rejected() {
        let mut cart = Cart::default();
        let result = cart.add(&ProductId::new("p1"), snapshot("Burger", 1, 5), 0);
        assert_eq!(result, Err(CartError::InvalidQuantity));
    }

    #[test]
    fn test_set_quantity_clamps() {
        let mut cart = Cart::default();
        let id = ProductId::new("p1");
        cart.add(&id, snapshot("Burger", 50_000, 4), 1).expect("add");
        let update = cart.set_quantity(&id, 9).expect("set");
        assert_eq!(update.quantity, 4);
        assert!(update.warning.is_some());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::default();
        let id = ProductId::new("p1");
        cart.add(&id, snapshot("Burger", 50_000, 4), 1).expect("add");
        cart.set_quantity(&id, 0).expect("set");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_missing_line() {
        let mut cart = Cart::default();
        let id = ProductId::new("ghost");
        assert_eq!(cart.set_quantity(&id, 2), Err(CartError::NotInCart(id)));
    }

    #[test]
    fn test_subtotal_is_sum_of_lines() {
        let mut cart = Cart::default();
        cart.add(&ProductId::new("p1"), snapshot("Burger", 59_000, 10), 2)
            .expect("add");
        cart.add(&ProductId::new("p2"), snapshot("Pepsi", 15_000, 10), 3)
            .expect("add");
        assert_eq!(cart.subtotal(), Decimal::from(59_000 * 2 + 15_000 * 3));
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_stock_warning_message() {
        let warning = StockWarning {
            requested: 7,
            available: 5,
        };
        assert!(warning.message("Burger").contains("5 Burger"));
    }
}
