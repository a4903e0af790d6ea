//! Shared fixtures: a seeded catalog, a customer profile, and an in-memory
//! order gateway.

use std::sync::Mutex;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use greenbasket_core::{
    AddressId, CurrencyCode, CustomerId, Money, OrderId, PaymentMethodId, ProductId,
    ProductStatus, StoreId, UserId,
};
use greenbasket_storefront::catalog::{CatalogStore, Product, Store};
use greenbasket_storefront::checkout::{GatewayError, Order, OrderDraft, OrderGateway};
use greenbasket_storefront::profile::{Address, CustomerProfile, PaymentDetails, PaymentMethod};

pub const OWNER: UserId = UserId::new(100);
pub const CUSTOMER: CustomerId = CustomerId::new(1);

#[must_use]
pub fn store(id: i32, name: &str, categories: &[&str]) -> Store {
    Store {
        id: StoreId::new(id),
        name: name.to_string(),
        rating: 4.5,
        delivery_time: "20-35 min".to_string(),
        distance: "1.2 km".to_string(),
        categories: categories.iter().map(ToString::to_string).collect(),
        owner_id: OWNER,
        is_favorite: false,
    }
}

#[must_use]
pub fn product(id: i32, store_id: i32, name: &str, category: &str, price: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        store_id: StoreId::new(store_id),
        name: name.to_string(),
        category: category.to_string(),
        price: Money::new(price, CurrencyCode::GHS),
        discount_price: None,
        stock: 25,
        sku: format!("SKU-{id:04}"),
        status: ProductStatus::Active,
        featured: false,
        sales: 0,
        revenue: Money::zero(CurrencyCode::GHS),
        image: format!("/images/products/{id}.jpg"),
        description: None,
        unit_label: Some("per kg".to_string()),
        rating: None,
    }
}

/// Catalog with two stores and a handful of products, the way a small
/// deployment would look after onboarding.
#[must_use]
pub fn seeded_catalog() -> CatalogStore {
    let mut catalog = CatalogStore::new();
    catalog
        .add_store(store(1, "Makola Fresh Market", &["Fruits", "Vegetables"]))
        .expect("seed store 1");
    catalog
        .add_store(store(2, "Osu Mini Mart", &["Dairy", "Bakery"]))
        .expect("seed store 2");

    catalog
        .add_product(product(1, 1, "Fresh Bananas", "Fruits", dec!(10.00)))
        .expect("seed product 1");
    catalog
        .add_product(product(2, 1, "Ripe Tomatoes", "Vegetables", dec!(5.00)))
        .expect("seed product 2");
    catalog
        .add_product(product(3, 1, "Garden Eggs", "Vegetables", dec!(4.00)))
        .expect("seed product 3");
    catalog
        .add_product(product(4, 2, "Fan Milk Yoghurt", "Dairy", dec!(6.50)))
        .expect("seed product 4");
    catalog
        .add_product(product(5, 2, "Sugar Bread", "Bakery", dec!(8.00)))
        .expect("seed product 5");
    catalog
}

/// Profile with one default address and one default MoMo method.
#[must_use]
pub fn seeded_profile() -> CustomerProfile {
    let mut profile = CustomerProfile::new(CUSTOMER);
    profile.save_address(Address {
        id: AddressId::new(1),
        name: "Home".to_string(),
        address: "12 Oxford Street, Osu, Accra".to_string(),
        details: Some("Blue gate, second floor".to_string()),
        latitude: 5.556,
        longitude: -0.1969,
        is_default: true,
    });
    profile.save_payment_method(PaymentMethod {
        id: PaymentMethodId::new(1),
        name: "Personal MoMo".to_string(),
        details: PaymentDetails::Momo {
            number: "0244000000".to_string(),
            provider: "MTN".to_string(),
            account_name: "Ama Mensah".to_string(),
        },
        is_default: true,
    });
    profile
}

/// Order gateway that accepts every draft and keeps the placed orders.
#[derive(Default)]
pub struct InMemoryGateway {
    orders: Mutex<Vec<Order>>,
}

impl InMemoryGateway {
    /// Orders placed so far, in placement order.
    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().expect("gateway lock").clone()
    }
}

impl OrderGateway for InMemoryGateway {
    async fn create_order(&self, draft: OrderDraft) -> Result<Order, GatewayError> {
        let order = Order::from_draft(OrderId::new_random(), draft, Utc::now());
        self.orders
            .lock()
            .expect("gateway lock")
            .push(order.clone());
        Ok(order)
    }
}
