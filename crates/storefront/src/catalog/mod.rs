//! Catalog of stores and products.
//!
//! [`CatalogStore`] is the single source of truth for stores and products.
//! All other components read through it and never hold independent copies.
//! It is an explicit repository object constructed once per process (or per
//! test) and injected into consumers - there is no ambient singleton.
//!
//! Result ordering everywhere is catalog insertion order.

pub mod search;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use greenbasket_core::{Money, ProductId, ProductStatus, StoreId, UserId};

/// Products with `stock` at or below this count as low stock in
/// [`CatalogStore::product_stats`]. Fixed policy constant.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// A grocery store listed in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    /// 0-5 star rating.
    pub rating: f32,
    /// Display string, e.g. "20-35 min".
    pub delivery_time: String,
    /// Display string, e.g. "1.2 km".
    pub distance: String,
    /// Ordered list of category tags.
    pub categories: Vec<String>,
    /// The store owner's user account.
    pub owner_id: UserId,
    /// Per-viewer favourite flag.
    pub is_favorite: bool,
}

/// A product belonging to exactly one store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub name: String,
    /// Single category tag.
    pub category: String,
    pub price: Money,
    /// Promotional price; when set it is charged instead of `price`.
    pub discount_price: Option<Money>,
    pub stock: u32,
    pub sku: String,
    pub status: ProductStatus,
    pub featured: bool,
    /// Running sales counter (units sold).
    pub sales: u32,
    /// Running revenue counter.
    pub revenue: Money,
    pub image: String,
    pub description: Option<String>,
    /// Display unit, e.g. "per kg".
    pub unit_label: Option<String>,
    pub rating: Option<f32>,
}

impl Product {
    /// Whether a customer can see (and buy) this product.
    ///
    /// A product is customer-visible iff it is active and in stock. Every
    /// customer-facing query applies this gate as a precondition.
    #[must_use]
    pub const fn customer_visible(&self) -> bool {
        self.status.is_active() && self.stock > 0
    }

    /// The price a customer is actually charged.
    #[must_use]
    pub fn effective_price(&self) -> Money {
        self.discount_price.unwrap_or(self.price)
    }
}

/// Partial update for a store. Unset fields keep their prior value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StorePatch {
    pub name: Option<String>,
    pub rating: Option<f32>,
    pub delivery_time: Option<String>,
    pub distance: Option<String>,
    pub categories: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
}

impl StorePatch {
    fn apply(self, store: &mut Store) {
        if let Some(name) = self.name {
            store.name = name;
        }
        if let Some(rating) = self.rating {
            store.rating = rating;
        }
        if let Some(delivery_time) = self.delivery_time {
            store.delivery_time = delivery_time;
        }
        if let Some(distance) = self.distance {
            store.distance = distance;
        }
        if let Some(categories) = self.categories {
            store.categories = categories;
        }
        if let Some(is_favorite) = self.is_favorite {
            store.is_favorite = is_favorite;
        }
    }
}

/// Partial update for a product. Unset fields keep their prior value.
///
/// `discount_price`, `description`, `unit_label`, and `rating` are doubly
/// optional so a patch can distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    #[serde(default, with = "double_option")]
    pub discount_price: Option<Option<Money>>,
    pub stock: Option<u32>,
    pub sku: Option<String>,
    pub status: Option<ProductStatus>,
    pub featured: Option<bool>,
    pub image: Option<String>,
    #[serde(default, with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub unit_label: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub rating: Option<Option<f32>>,
}

/// Deserialize `Option<Option<T>>` so that an explicit `null` clears the
/// field while absence leaves it untouched.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

impl ProductPatch {
    fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(discount_price) = self.discount_price {
            product.discount_price = discount_price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(sku) = self.sku {
            product.sku = sku;
        }
        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(featured) = self.featured {
            product.featured = featured;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(unit_label) = self.unit_label {
            product.unit_label = unit_label;
        }
        if let Some(rating) = self.rating {
            product.rating = rating;
        }
    }
}

/// Aggregate product counters for a store owner's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    /// Total products across the owner's stores.
    pub total: usize,
    /// Products with `stock <= LOW_STOCK_THRESHOLD`.
    pub low_stock: usize,
    /// Products with active status.
    pub active: usize,
    /// Sum of the products' revenue counters.
    pub revenue: Money,
}

/// Errors from catalog mutations.
///
/// Queries never fail; an empty result is a valid response, not an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("store {0} already exists")]
    DuplicateStore(StoreId),

    #[error("store {0} not found")]
    StoreNotFound(StoreId),

    #[error("product {0} already exists")]
    DuplicateProduct(ProductId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// A product referenced a store that is not in the catalog.
    #[error("product {product} references unknown store {store}")]
    UnknownStore { product: ProductId, store: StoreId },

    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),
}

/// In-memory repository of stores and products.
#[derive(Debug, Default)]
pub struct CatalogStore {
    stores: Vec<Store>,
    products: Vec<Product>,
}

impl CatalogStore {
    /// Create an empty catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stores: Vec::new(),
            products: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Store CRUD
    // ─────────────────────────────────────────────────────────────────────

    /// Add a store to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateStore`] if the id is already taken.
    #[instrument(skip(self, store), fields(store_id = %store.id))]
    pub fn add_store(&mut self, store: Store) -> Result<(), CatalogError> {
        if self.store(store.id).is_some() {
            return Err(CatalogError::DuplicateStore(store.id));
        }
        info!(name = %store.name, "store added");
        self.stores.push(store);
        Ok(())
    }

    /// Apply a partial update to a store.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreNotFound`] for an unknown id.
    #[instrument(skip(self, patch))]
    pub fn update_store(&mut self, id: StoreId, patch: StorePatch) -> Result<(), CatalogError> {
        let store = self
            .stores
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(CatalogError::StoreNotFound(id))?;
        patch.apply(store);
        Ok(())
    }

    /// Delete a store and every product that belongs to it.
    ///
    /// The cascade guarantees no dangling product remains queryable.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreNotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn delete_store(&mut self, id: StoreId) -> Result<(), CatalogError> {
        let before = self.stores.len();
        self.stores.retain(|s| s.id != id);
        if self.stores.len() == before {
            return Err(CatalogError::StoreNotFound(id));
        }
        let products_before = self.products.len();
        self.products.retain(|p| p.store_id != id);
        info!(
            cascaded = products_before - self.products.len(),
            "store deleted"
        );
        Ok(())
    }

    /// Toggle the per-viewer favourite flag on a store.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StoreNotFound`] for an unknown id.
    pub fn set_favorite(&mut self, id: StoreId, is_favorite: bool) -> Result<(), CatalogError> {
        let store = self
            .stores
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(CatalogError::StoreNotFound(id))?;
        store.is_favorite = is_favorite;
        Ok(())
    }

    /// Look up a store by id.
    #[must_use]
    pub fn store(&self, id: StoreId) -> Option<&Store> {
        self.stores.iter().find(|s| s.id == id)
    }

    /// All stores, in insertion order.
    #[must_use]
    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    // ─────────────────────────────────────────────────────────────────────
    // Product CRUD
    // ─────────────────────────────────────────────────────────────────────

    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownStore`] if `store_id` does not
    /// reference an existing store, [`CatalogError::DuplicateProduct`] if the
    /// id is taken, or [`CatalogError::NegativePrice`] for a negative price.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_product(&mut self, product: Product) -> Result<(), CatalogError> {
        if self.store(product.store_id).is_none() {
            return Err(CatalogError::UnknownStore {
                product: product.id,
                store: product.store_id,
            });
        }
        if self.product(product.id).is_some() {
            return Err(CatalogError::DuplicateProduct(product.id));
        }
        if product.price.is_negative()
            || product.discount_price.is_some_and(|p| p.is_negative())
        {
            return Err(CatalogError::NegativePrice(product.id));
        }
        info!(name = %product.name, store_id = %product.store_id, "product added");
        self.products.push(product);
        Ok(())
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] for an unknown id, or
    /// [`CatalogError::NegativePrice`] if the patch would set one.
    #[instrument(skip(self, patch))]
    pub fn update_product(&mut self, id: ProductId, patch: ProductPatch) -> Result<(), CatalogError> {
        if patch.price.is_some_and(|p| p.is_negative())
            || patch
                .discount_price
                .flatten()
                .is_some_and(|p| p.is_negative())
        {
            return Err(CatalogError::NegativePrice(id));
        }
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(CatalogError::ProductNotFound(id))?;
        patch.apply(product);
        Ok(())
    }

    /// Delete a product. Immediate and irreversible; there is no soft-delete.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn delete_product(&mut self, id: ProductId) -> Result<(), CatalogError> {
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        if self.products.len() == before {
            return Err(CatalogError::ProductNotFound(id));
        }
        Ok(())
    }

    /// Look up a product by id.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// All products, in insertion order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    // ─────────────────────────────────────────────────────────────────────
    // Read queries
    // ─────────────────────────────────────────────────────────────────────

    /// All products for a store regardless of status or stock
    /// (administrative view).
    #[must_use]
    pub fn store_products(&self, store_id: StoreId) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.store_id == store_id)
            .collect()
    }

    /// Active products for a store. No stock filter.
    #[must_use]
    pub fn active_products(&self, store_id: StoreId) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.store_id == store_id && p.status.is_active())
            .collect()
    }

    /// Customer-visible products for a store: active and in stock.
    #[must_use]
    pub fn customer_store_products(&self, store_id: StoreId) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.store_id == store_id && p.customer_visible())
            .collect()
    }

    /// Customer-visible products flagged as featured for a store.
    #[must_use]
    pub fn featured_products(&self, store_id: StoreId) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.store_id == store_id && p.customer_visible() && p.featured)
            .collect()
    }

    /// Union of products across every store the owner runs.
    #[must_use]
    pub fn store_owner_products(&self, owner_id: UserId) -> Vec<&Product> {
        let owned: Vec<StoreId> = self
            .stores
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .map(|s| s.id)
            .collect();
        self.products
            .iter()
            .filter(|p| owned.contains(&p.store_id))
            .collect()
    }

    /// Dashboard aggregates over an owner's products.
    ///
    /// Revenue is summed in the owner's first product's currency; an owner
    /// with no products gets a zero total in the default currency.
    #[must_use]
    pub fn product_stats(&self, owner_id: UserId) -> ProductStats {
        let products = self.store_owner_products(owner_id);
        let currency = products
            .first()
            .map_or_else(Default::default, |p| p.revenue.currency);
        let revenue = products
            .iter()
            .fold(Money::zero(currency), |acc, p| acc + p.revenue);
        ProductStats {
            total: products.len(),
            low_stock: products
                .iter()
                .filter(|p| p.stock <= LOW_STOCK_THRESHOLD)
                .count(),
            active: products.iter().filter(|p| p.status.is_active()).count(),
            revenue,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Counters
    // ─────────────────────────────────────────────────────────────────────

    /// Record a sale against a product after an order is placed: decrements
    /// stock (saturating at zero) and bumps the sales and revenue counters
    /// by the effective price.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn record_sale(&mut self, id: ProductId, quantity: u32) -> Result<(), CatalogError> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(CatalogError::ProductNotFound(id))?;
        let earned = product.effective_price().times(quantity);
        product.stock = product.stock.saturating_sub(quantity);
        product.sales += quantity;
        product.revenue += earned;
        info!(quantity, stock = product.stock, "sale recorded");
        Ok(())
    }
}
