//! Per-session shopping cart.
//!
//! A cart is scoped to exactly one store at a time: the first item binds the
//! cart to its store, and items from other stores are rejected until the
//! cart is emptied. Lines keep a snapshot of the product as it was added;
//! the checkout flow re-reads nothing from the catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use greenbasket_core::{Money, ProductId, StoreId};

use crate::catalog::Product;

/// One product-quantity pair in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: Product,
    /// Always >= 1.
    pub quantity: u32,
}

impl CartLine {
    /// Charged price for this line: effective unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product.effective_price().times(self.quantity)
    }
}

/// Errors from cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The cart is bound to a different store.
    #[error("cart belongs to store {bound}, cannot add product from store {offered}")]
    DifferentStore { bound: StoreId, offered: StoreId },

    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// The cart aggregate: an ordered list of lines bound to a single store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    store_id: Option<StoreId>,
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty, unbound cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            store_id: None,
            lines: Vec::new(),
        }
    }

    /// Add a product, merging the quantity onto an existing line for the
    /// same product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] for a zero quantity, or
    /// [`CartError::DifferentStore`] when the cart is already bound to
    /// another store.
    pub fn add_item(&mut self, product: Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if let Some(bound) = self.store_id
            && bound != product.store_id
        {
            return Err(CartError::DifferentStore {
                bound,
                offered: product.store_id,
            });
        }
        self.store_id = Some(product.store_id);
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine { product, quantity });
        }
        Ok(())
    }

    /// Set the quantity on an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] for a zero quantity (use
    /// [`Cart::remove_item`] to drop a line), or [`CartError::NotInCart`]
    /// for a product the cart does not hold.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product.id == product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a line. Removing the last line unbinds the store so the
    /// customer can start shopping elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] for a product the cart does not hold.
    pub fn remove_item(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product.id != product_id);
        if self.lines.len() == before {
            return Err(CartError::NotInCart(product_id));
        }
        if self.lines.is_empty() {
            self.store_id = None;
        }
        Ok(())
    }

    /// Empty the cart and unbind the store.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.store_id = None;
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals: Σ (discount price if set, else price) × quantity.
    ///
    /// An empty cart subtotals to zero in the default currency.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        let currency = self
            .lines
            .first()
            .map_or_else(Default::default, |l| l.product.price.currency);
        self.lines
            .iter()
            .fold(Money::zero(currency), |acc, l| acc + l.line_total())
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The lines, in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The store the cart is currently bound to, if any.
    #[must_use]
    pub const fn store_id(&self) -> Option<StoreId> {
        self.store_id
    }
}
