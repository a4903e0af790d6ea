//! Search and filter rules over the catalog.
//!
//! Deliberately cheap: synchronous, substring-only, no index, no relevance
//! ranking. That is appropriate for a small in-memory catalog, and the
//! behavioural contract matters more than speed: matching is OR across
//! fields, and the customer-visibility gate is a precondition of every
//! query here, never a postcondition.

use greenbasket_core::StoreId;

use super::{CatalogStore, Product, Store};

/// Sentinel category meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// Case-insensitive substring test.
fn matches(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Search customer-visible products by free text.
///
/// Starts from customer-visible products (active and in stock), optionally
/// narrowed to one store. A blank query keeps everything; otherwise a product
/// matches when the query is a case-insensitive substring of its `name`,
/// `sku`, OR `category` - matching any one field is sufficient. Results are
/// in catalog insertion order.
#[must_use]
pub fn search_products<'a>(
    catalog: &'a CatalogStore,
    query: &str,
    store_id: Option<StoreId>,
) -> Vec<&'a Product> {
    let query = query.trim().to_lowercase();
    catalog
        .products()
        .iter()
        .filter(|p| p.customer_visible())
        .filter(|p| store_id.is_none_or(|id| p.store_id == id))
        .filter(|p| {
            query.is_empty()
                || matches(&p.name, &query)
                || matches(&p.sku, &query)
                || matches(&p.category, &query)
        })
        .collect()
}

/// Filter customer-visible products by category tag.
///
/// [`ALL_CATEGORIES`] means no category filter; any other value requires
/// exact, case-sensitive equality with the product's category.
#[must_use]
pub fn products_by_category<'a>(
    catalog: &'a CatalogStore,
    category: &str,
    store_id: Option<StoreId>,
) -> Vec<&'a Product> {
    catalog
        .products()
        .iter()
        .filter(|p| p.customer_visible())
        .filter(|p| store_id.is_none_or(|id| p.store_id == id))
        .filter(|p| category == ALL_CATEGORIES || p.category == category)
        .collect()
}

/// Search stores by free text.
///
/// A blank query returns nothing - there is no "browse all" fallback. A
/// store matches when the query is a case-insensitive substring of its name
/// or of any of its category tags.
#[must_use]
pub fn search_stores<'a>(catalog: &'a CatalogStore, query: &str) -> Vec<&'a Store> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    catalog
        .stores()
        .iter()
        .filter(|s| matches(&s.name, &query) || s.categories.iter().any(|c| matches(c, &query)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductPatch;
    use greenbasket_core::{CurrencyCode, Money, ProductId, ProductStatus, UserId};
    use rust_decimal_macros::dec;

    fn seeded() -> CatalogStore {
        let mut catalog = CatalogStore::new();
        catalog
            .add_store(Store {
                id: StoreId::new(1),
                name: "Mama Efua's Market".to_string(),
                rating: 4.8,
                delivery_time: "15-25 min".to_string(),
                distance: "0.8 km".to_string(),
                categories: vec!["Fresh Produce".to_string(), "Bakery".to_string()],
                owner_id: UserId::new(100),
                is_favorite: false,
            })
            .expect("store 1");
        catalog
            .add_store(Store {
                id: StoreId::new(2),
                name: "Quick Basket".to_string(),
                rating: 4.1,
                delivery_time: "30-45 min".to_string(),
                distance: "2.4 km".to_string(),
                categories: vec!["Household".to_string()],
                owner_id: UserId::new(200),
                is_favorite: false,
            })
            .expect("store 2");

        let base = |id: i32, store: i32, name: &str, category: &str, sku: &str| Product {
            id: ProductId::new(id),
            store_id: StoreId::new(store),
            name: name.to_string(),
            category: category.to_string(),
            price: Money::new(dec!(4.00), CurrencyCode::GHS),
            discount_price: None,
            stock: 12,
            sku: sku.to_string(),
            status: ProductStatus::Active,
            featured: false,
            sales: 0,
            revenue: Money::zero(CurrencyCode::GHS),
            image: String::new(),
            description: None,
            unit_label: None,
            rating: None,
        };

        catalog
            .add_product(base(1, 1, "Ripe Plantain", "Fruits", "PLT-001"))
            .expect("p1");
        catalog
            .add_product(base(2, 1, "Sugar Bread", "Bakery", "BRD-002"))
            .expect("p2");
        catalog
            .add_product(base(3, 2, "Laundry Soap", "Household", "ABC-003"))
            .expect("p3");
        catalog
    }

    #[test]
    fn test_search_is_or_across_fields() {
        let catalog = seeded();
        // "ABC" only appears in product 3's SKU, case-insensitively.
        let hits: Vec<_> = search_products(&catalog, "abc", None)
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(hits, vec![3]);
        // Category matches too.
        let hits: Vec<_> = search_products(&catalog, "bakery", None)
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(hits, vec![2]);
    }

    #[test]
    fn test_search_applies_visibility_gate() {
        let mut catalog = seeded();
        catalog
            .update_product(
                ProductId::new(1),
                ProductPatch {
                    stock: Some(0),
                    ..ProductPatch::default()
                },
            )
            .expect("patch");
        assert!(search_products(&catalog, "plantain", None).is_empty());
    }

    #[test]
    fn test_search_narrows_by_store_and_blank_query_keeps_all() {
        let catalog = seeded();
        let hits = search_products(&catalog, "   ", Some(StoreId::new(1)));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_category_filter_sentinel_and_case() {
        let catalog = seeded();
        assert_eq!(products_by_category(&catalog, ALL_CATEGORIES, None).len(), 3);
        assert_eq!(products_by_category(&catalog, "Bakery", None).len(), 1);
        // Exact case-sensitive equality, unlike text search.
        assert!(products_by_category(&catalog, "bakery", None).is_empty());
    }

    #[test]
    fn test_store_search_blank_query_returns_empty() {
        let catalog = seeded();
        assert!(search_stores(&catalog, "").is_empty());
        assert!(search_stores(&catalog, "  ").is_empty());
    }

    #[test]
    fn test_store_search_matches_name_or_category_tag() {
        let catalog = seeded();
        let hits: Vec<_> = search_stores(&catalog, "efua")
            .iter()
            .map(|s| s.id.as_i32())
            .collect();
        assert_eq!(hits, vec![1]);
        // "household" only matches store 2 via its category tag.
        let hits: Vec<_> = search_stores(&catalog, "HOUSEHOLD")
            .iter()
            .map(|s| s.id.as_i32())
            .collect();
        assert_eq!(hits, vec![2]);
    }
}
